//! Declarative feature styles.
//!
//! A style colors each feature by binning one numeric property against an
//! ascending list of color bins, and decides visibility with a boolean show
//! expression. Styles are built from JSON documents or assembled directly.

pub mod expressions;
pub mod parser;
pub mod types;

pub use expressions::{
    evaluate_expression, ConstantShow, EvalContext, JsonExpression, ShowExpression,
};
pub use parser::{build_style, parse_style, parse_style_str, StyleJson};
pub use types::{ColorBin, ColorBinTable, ColorRule, Style};
