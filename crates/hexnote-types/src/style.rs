//! Custom annotation styling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An RGBA color, persisted as `#rrggbb` (or `#rrggbbaa` when translucent).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const LIGHT_GRAY: Color = Color::rgb(192, 192, 192);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Hex form with a leading `#`. Alpha is omitted when opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{}", hex::encode([self.r, self.g, self.b]))
        } else {
            format!("#{}", hex::encode([self.r, self.g, self.b, self.a]))
        }
    }
}

impl FromStr for Color {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| TypeError::InvalidColor(format!("missing '#' in {s:?}")))?;
        let bytes = hex::decode(digits).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        match bytes.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Color::rgba(*r, *g, *b, *a)),
            _ => Err(TypeError::InvalidColor(format!(
                "expected 6 or 8 hex digits, got {s:?}"
            ))),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({})", self.to_hex())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// How the outline of an annotated region is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Dotted,
}

/// A user-chosen style for an annotation: stroke plus border and
/// background colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParametricStyle {
    pub stroke: StrokeStyle,
    pub border: Color,
    pub background: Color,
}

impl ParametricStyle {
    pub fn new(stroke: StrokeStyle, border: Color, background: Color) -> Self {
        Self {
            stroke,
            border,
            background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_color_omits_alpha() {
        assert_eq!(Color::RED.to_hex(), "#ff0000");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn parse_color() {
        assert_eq!("#c0c0c0".parse::<Color>().unwrap(), Color::LIGHT_GRAY);
        assert_eq!(
            "#01020304".parse::<Color>().unwrap(),
            Color::rgba(1, 2, 3, 4)
        );
    }

    #[test]
    fn parse_rejects_malformed_colors() {
        assert!(matches!(
            "ff0000".parse::<Color>(),
            Err(TypeError::InvalidColor(_))
        ));
        assert!(matches!(
            "#zz0000".parse::<Color>(),
            Err(TypeError::InvalidHex(_))
        ));
        assert!(matches!(
            "#ff00".parse::<Color>(),
            Err(TypeError::InvalidColor(_))
        ));
    }

    #[test]
    fn style_serializes_as_plain_strings() {
        let style = ParametricStyle::new(StrokeStyle::Dashed, Color::RED, Color::WHITE);
        let json = serde_json::to_value(style).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stroke": "dashed",
                "border": "#ff0000",
                "background": "#ffffff"
            })
        );
        let parsed: ParametricStyle = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, style);
    }
}
