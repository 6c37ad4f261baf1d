//! RGBA colors assigned to styled features.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque white, the neutral color of unstyled features.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array(rgba: [f32; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantize to 8-bit RGBA, the layout render primitives upload per feature.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Color as written in a style document: a CSS string or an `[r, g, b, a]` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    String(String),
    Array([f32; 4]),
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorValue::deserialize(deserializer)? {
            ColorValue::Array(rgba) => Ok(Color::from_array(rgba)),
            ColorValue::String(s) => parse_color_string(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s:?}"))),
        }
    }
}

/// Parse a CSS color string (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
/// `rgb()`, `rgba()` or a named color).
pub fn parse_color_string(s: &str) -> Option<Color> {
    let s = s.trim();

    if s.starts_with('#') {
        return parse_hex_color(s);
    }

    if s.starts_with("rgb") {
        return parse_rgb_color(s);
    }

    let rgba = match s.to_lowercase().as_str() {
        "black" => [0.0, 0.0, 0.0, 1.0],
        "white" => [1.0, 1.0, 1.0, 1.0],
        "red" => [1.0, 0.0, 0.0, 1.0],
        "green" => [0.0, 0.5, 0.0, 1.0],
        "lime" => [0.0, 1.0, 0.0, 1.0],
        "blue" => [0.0, 0.0, 1.0, 1.0],
        "yellow" => [1.0, 1.0, 0.0, 1.0],
        "cyan" => [0.0, 1.0, 1.0, 1.0],
        "magenta" => [1.0, 0.0, 1.0, 1.0],
        "gray" | "grey" => [0.5, 0.5, 0.5, 1.0],
        "orange" => [1.0, 0.647, 0.0, 1.0],
        "transparent" => return Some(Color::TRANSPARENT),
        _ => return None,
    };
    Some(Color::from_array(rgba))
}

fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| -> Option<f32> {
        let digits = &hex[range];
        let digits = if digits.len() == 1 { digits.repeat(2) } else { digits.to_string() };
        u8::from_str_radix(&digits, 16).ok().map(|v| v as f32 / 255.0)
    };

    match hex.len() {
        3 => Some(Color::new(channel(0..1)?, channel(1..2)?, channel(2..3)?, 1.0)),
        4 => Some(Color::new(channel(0..1)?, channel(1..2)?, channel(2..3)?, channel(3..4)?)),
        6 => Some(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0)),
        8 => Some(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, channel(6..8)?)),
        _ => None,
    }
}

fn parse_rgb_color(s: &str) -> Option<Color> {
    let inner = s
        .trim_start_matches("rgba(")
        .trim_start_matches("rgb(")
        .trim_end_matches(')');
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();

    if parts.len() < 3 {
        return None;
    }

    let component = |p: &str| -> Option<f32> {
        match p.strip_suffix('%') {
            Some(percent) => percent.trim().parse::<f32>().ok().map(|v| v / 100.0),
            None => p.parse::<f32>().ok().map(|v| v / 255.0),
        }
    };

    let a = match parts.get(3) {
        Some(alpha) => alpha.parse().ok()?,
        None => 1.0,
    };

    Some(Color::new(component(parts[0])?, component(parts[1])?, component(parts[2])?, a))
}
