//! Mentor card payload.

use super::{ImagePayload, TextStyle};

/// A card introducing a mentor: a caption plus an optional portrait.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorCard {
    /// Caption (usually the mentor's name and a short note).
    pub content: String,
    pub style: TextStyle,
    pub portrait: Option<ImagePayload>,
}

impl MentorCard {
    pub const PLACEHOLDER: &'static str = "Mentor name";

    pub fn placeholder() -> Self {
        Self {
            content: Self::PLACEHOLDER.to_string(),
            style: TextStyle {
                font_size: 18.0,
                ..TextStyle::default()
            },
            portrait: None,
        }
    }
}
