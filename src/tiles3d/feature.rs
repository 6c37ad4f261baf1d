//! Per-feature properties and style outputs of a batched tile payload

use std::collections::HashMap;

use crate::color::Color;

/// A single batch table value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl PropertyValue {
    /// Convert a batch table JSON element. Arrays, objects and nulls have no
    /// scalar representation and are treated as missing.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Boolean(*b)),
            _ => None,
        }
    }

    /// Numeric coercion used for color binning.
    ///
    /// Booleans map to 0/1, numeric strings parse and blank strings are 0;
    /// anything else is NaN, which never compares below a bin maximum.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Leaf tile content: a flat collection of features stored column-wise,
/// mirroring the layout of a 3D Tiles batch table.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    length: usize,
    /// Property columns keyed by name. Every column has `length` entries;
    /// `None` marks a feature with no value for that property.
    properties: HashMap<String, Vec<Option<PropertyValue>>>,
    colors: Vec<Color>,
    show: Vec<bool>,
}

impl FeatureBatch {
    /// Create a batch of `length` features with no properties, all shown and white.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            properties: HashMap::new(),
            colors: vec![Color::WHITE; length],
            show: vec![true; length],
        }
    }

    /// Attach a property column. Short columns are padded with missing values
    /// and long ones truncated to the batch length.
    pub fn with_property<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropertyValue>,
    {
        let column = values.into_iter().map(|v| Some(v.into())).collect();
        self.insert_column(name, column);
        self
    }

    pub(crate) fn insert_column(&mut self, name: &str, mut column: Vec<Option<PropertyValue>>) {
        column.resize(self.length, None);
        self.properties.insert(name.to_string(), column);
    }

    /// Number of features in the batch
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Names of the property columns
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Read-only view of feature `index`
    pub fn feature(&self, index: usize) -> Option<FeatureView<'_>> {
        (index < self.length).then_some(FeatureView { batch: self, index })
    }

    /// Write the style outputs of feature `index`.
    pub fn set_style(&mut self, index: usize, color: Color, show: bool) {
        if index < self.length {
            self.colors[index] = color;
            self.show[index] = show;
        }
    }

    /// Reset every feature to shown with `color`.
    pub fn reset_style(&mut self, color: Color) {
        self.colors.fill(color);
        self.show.fill(true);
    }

    /// Per-feature colors, in batch order
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Per-feature visibility, in batch order
    pub fn show_flags(&self) -> &[bool] {
        &self.show
    }
}

/// Accessor for one feature of a [`FeatureBatch`]
#[derive(Debug, Clone, Copy)]
pub struct FeatureView<'a> {
    batch: &'a FeatureBatch,
    index: usize,
}

impl<'a> FeatureView<'a> {
    /// Batch id of the feature
    pub fn index(&self) -> usize {
        self.index
    }

    /// Look up a property; `None` when the batch has no such column or the
    /// feature has no value in it.
    pub fn property(&self, name: &str) -> Option<&'a PropertyValue> {
        self.batch.properties.get(name)?.get(self.index)?.as_ref()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn color(&self) -> Color {
        self.batch.colors[self.index]
    }

    pub fn show(&self) -> bool {
        self.batch.show[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_lookup() {
        let batch = FeatureBatch::new(3)
            .with_property("height", [4.0, 12.0])
            .with_property("name", ["a", "b", "c"]);

        let f = batch.feature(1).unwrap();
        assert_eq!(f.property("height"), Some(&PropertyValue::Number(12.0)));
        assert_eq!(f.property("name").and_then(|v| v.as_str()), Some("b"));

        // Padded column and unknown column both read as missing
        let last = batch.feature(2).unwrap();
        assert_eq!(last.property("height"), None);
        assert!(!last.has_property("roof"));

        assert!(batch.feature(3).is_none());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(PropertyValue::Number(2.5).as_number(), 2.5);
        assert_eq!(PropertyValue::Boolean(true).as_number(), 1.0);
        assert_eq!(PropertyValue::from(" 42 ").as_number(), 42.0);
        assert!(PropertyValue::from("tall").as_number().is_nan());
        assert_eq!(PropertyValue::from("").as_number(), 0.0);
        assert_eq!(PropertyValue::from("   ").as_number(), 0.0);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            PropertyValue::from_json(&serde_json::json!(3)),
            Some(PropertyValue::Number(3.0))
        );
        assert_eq!(PropertyValue::from_json(&serde_json::json!(null)), None);
        assert_eq!(PropertyValue::from_json(&serde_json::json!([1, 2])), None);
    }

    #[test]
    fn test_style_outputs() {
        let mut batch = FeatureBatch::new(2);
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        batch.set_style(0, red, false);
        batch.set_style(7, red, false);
        assert_eq!(batch.colors(), &[red, Color::WHITE]);
        assert_eq!(batch.show_flags(), &[false, true]);

        batch.reset_style(Color::WHITE);
        assert!(batch.show_flags().iter().all(|&s| s));
        assert!(batch.colors().iter().all(|&c| c == Color::WHITE));
    }
}
