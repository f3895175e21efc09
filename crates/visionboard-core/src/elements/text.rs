//! Text payload shared by text elements and mentor cards.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// Font attributes for text-bearing elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS font family name.
    pub font_family: String,
    pub font_weight: FontWeight,
    pub color: SerializableColor,
}

impl TextStyle {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Roboto";
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::default(),
            color: SerializableColor::black(),
        }
    }
}

/// Freeform text on the board.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub content: String,
    pub style: TextStyle,
}

impl TextBlock {
    pub const PLACEHOLDER: &'static str = "New text";

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: TextStyle::default(),
        }
    }

    /// Text block shown right after "add text".
    pub fn placeholder() -> Self {
        Self::new(Self::PLACEHOLDER)
    }
}
