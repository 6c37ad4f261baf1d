//! Style types: color bins, color rule and the assembled style.

use serde::Deserialize;

use super::expressions::{EvalContext, ShowExpression};
use crate::color::Color;
use crate::error::{StyleError, StyleResult};
use crate::tiles3d::FeatureView;

/// One color bin: values below `maximum` (and at or above the previous bin's
/// maximum) map to `color`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorBin {
    pub maximum: f64,
    pub color: Color,
}

impl ColorBin {
    pub fn new(maximum: f64, color: Color) -> Self {
        Self { maximum, color }
    }
}

/// Ascending, non-empty list of color bins.
///
/// Bins partition the number line into `(-inf, m0)`, `[m0, m1)`, ... and the
/// last bin also catches everything at or above its lower bound, including
/// `+inf`, NaN and values above every maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBinTable {
    bins: Vec<ColorBin>,
}

impl ColorBinTable {
    /// Build a table, rejecting empty lists, NaN maxima and descending maxima.
    pub fn new(bins: Vec<ColorBin>) -> StyleResult<Self> {
        if bins.is_empty() {
            return Err(StyleError::invalid_style("color bin list is empty"));
        }
        if let Some(i) = bins.iter().position(|b| b.maximum.is_nan()) {
            return Err(StyleError::invalid_style(format!("color bin {i} has a NaN maximum")));
        }
        if let Some(i) = bins.windows(2).position(|w| w[1].maximum < w[0].maximum) {
            return Err(StyleError::invalid_style(format!(
                "color bins are not sorted: bin {} maximum {} is below {}",
                i + 1,
                bins[i + 1].maximum,
                bins[i].maximum
            )));
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[ColorBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Smallest `j` with `value < bins[j].maximum`, clamped to the last bin.
    pub fn bin_index(&self, value: f64) -> usize {
        // `!(value < max)` rather than `max <= value` so NaN lands past the end
        let j = self.bins.partition_point(|b| !(value < b.maximum));
        j.min(self.bins.len() - 1)
    }

    pub fn color_for(&self, value: f64) -> Color {
        self.bins[self.bin_index(value)].color
    }
}

/// Color by binning the value of one feature property
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRule {
    pub property_name: String,
    pub bins: ColorBinTable,
}

impl ColorRule {
    pub fn new(property_name: impl Into<String>, bins: ColorBinTable) -> Self {
        Self {
            property_name: property_name.into(),
            bins,
        }
    }

    /// Color of `feature`. A missing or non-numeric property falls into the last bin.
    pub fn color_for(&self, feature: &FeatureView<'_>) -> Color {
        let value = feature
            .property(&self.property_name)
            .map_or(f64::NAN, |v| v.as_number());
        self.bins.color_for(value)
    }
}

/// A declarative style: a color rule and a show predicate.
///
/// Styles are immutable once built; the engine shares them behind an `Arc`.
#[derive(Debug)]
pub struct Style {
    pub color: ColorRule,
    pub show: Box<dyn ShowExpression>,
    time_dynamic: bool,
}

impl Style {
    pub fn new(color: ColorRule, show: Box<dyn ShowExpression>) -> Self {
        Self {
            color,
            show,
            time_dynamic: false,
        }
    }

    /// Force the style to be reapplied every frame
    pub fn with_time_dynamic(mut self, time_dynamic: bool) -> Self {
        self.time_dynamic = time_dynamic;
        self
    }

    /// True if the style output can change without reassignment, either because
    /// it was flagged or because its show expression depends on time.
    pub fn is_time_dynamic(&self) -> bool {
        self.time_dynamic || self.show.is_time_dynamic()
    }

    /// Evaluate color and visibility of one feature
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> (Color, bool) {
        (self.color.color_for(&ctx.feature), self.show.evaluate(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ConstantShow;
    use crate::tiles3d::FeatureBatch;

    const A: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    const B: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    const C: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    fn table() -> ColorBinTable {
        ColorBinTable::new(vec![
            ColorBin::new(10.0, A),
            ColorBin::new(20.0, B),
            ColorBin::new(30.0, C),
        ])
        .unwrap()
    }

    #[test]
    fn test_bin_boundaries() {
        let t = table();
        assert_eq!(t.color_for(9.999), A);
        assert_eq!(t.color_for(10.0), B);
        assert_eq!(t.color_for(19.999), B);
        assert_eq!(t.color_for(30.0), C);
        assert_eq!(t.color_for(1000.0), C);
        assert_eq!(t.color_for(f64::NEG_INFINITY), A);
        assert_eq!(t.color_for(f64::INFINITY), C);
        assert_eq!(t.color_for(f64::NAN), C);
    }

    #[test]
    fn test_binary_search_matches_linear_scan() {
        let t = ColorBinTable::new(vec![
            ColorBin::new(0.0, A),
            ColorBin::new(5.0, B),
            ColorBin::new(5.0, C),
            ColorBin::new(7.5, A),
        ])
        .unwrap();

        for i in -20..120 {
            let v = f64::from(i) * 0.1;
            let linear = t
                .bins()
                .iter()
                .position(|b| v < b.maximum)
                .unwrap_or(t.len())
                .min(t.len() - 1);
            assert_eq!(t.bin_index(v), linear, "value {v}");
        }
    }

    #[test]
    fn test_invalid_tables() {
        assert!(ColorBinTable::new(vec![]).is_err());
        assert!(ColorBinTable::new(vec![ColorBin::new(f64::NAN, A)]).is_err());
        assert!(ColorBinTable::new(vec![ColorBin::new(2.0, A), ColorBin::new(1.0, B)]).is_err());
    }

    #[test]
    fn test_color_rule_missing_property_clamps() {
        let rule = ColorRule::new("height", table());
        let batch = FeatureBatch::new(2).with_property("height", [15.0]);

        assert_eq!(rule.color_for(&batch.feature(0).unwrap()), B);
        assert_eq!(rule.color_for(&batch.feature(1).unwrap()), C);
    }

    #[test]
    fn test_time_dynamic_flag() {
        let style = Style::new(ColorRule::new("h", table()), Box::new(ConstantShow(true)));
        assert!(!style.is_time_dynamic());
        assert!(style.with_time_dynamic(true).is_time_dynamic());
    }
}
