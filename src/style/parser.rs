//! Style document JSON parser.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::expressions::{ConstantShow, JsonExpression, ShowExpression};
use super::types::{ColorBin, ColorBinTable, ColorRule, Style};
use crate::error::StyleResult;

/// Style document as written in JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleJson {
    pub color: ColorRuleJson,
    /// Show expression; a bare boolean or an array expression. Defaults to `true`.
    #[serde(default)]
    pub show: Option<serde_json::Value>,
    #[serde(default)]
    pub time_dynamic: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRuleJson {
    pub property_name: String,
    pub colors: Vec<ColorBin>,
}

/// Parse a style document from a file.
pub fn parse_style(path: &Path) -> StyleResult<Style> {
    let content = fs::read_to_string(path)?;
    parse_style_str(&content)
}

/// Parse a style document from a JSON string.
pub fn parse_style_str(json: &str) -> StyleResult<Style> {
    let doc: StyleJson = serde_json::from_str(json)?;
    build_style(doc)
}

/// Validate a parsed document and assemble the runtime style.
pub fn build_style(doc: StyleJson) -> StyleResult<Style> {
    let bins = ColorBinTable::new(doc.color.colors)?;
    let color = ColorRule::new(doc.color.property_name, bins);

    let show: Box<dyn ShowExpression> = match doc.show {
        None => Box::new(ConstantShow(true)),
        Some(serde_json::Value::Bool(b)) => Box::new(ConstantShow(b)),
        Some(expr) => Box::new(JsonExpression::new(expr)?),
    };

    let style = Style::new(color, show).with_time_dynamic(doc.time_dynamic);
    log::debug!(
        "parsed style: color by {:?} in {} bins, time dynamic: {}",
        style.color.property_name,
        style.color.bins.len(),
        style.is_time_dynamic()
    );
    Ok(style)
}
