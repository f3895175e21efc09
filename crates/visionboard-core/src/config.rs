//! Editor configuration.

use crate::elements::SerializableColor;
use serde::{Deserialize, Serialize};

/// Tunables for the canvas editor.
///
/// Every field has a default, so a JSON override only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Relative scale change per wheel notch.
    pub wheel_step: f64,
    /// Hit radius around a corner handle, in canvas units.
    pub handle_hit_tolerance: f64,
    /// Slack around an element's box when hit testing.
    pub element_hit_tolerance: f64,
    /// Hit distance for selecting a connection or arrow.
    pub link_hit_tolerance: f64,
    /// Smallest pointer distance from center used as a scale-drag reference.
    pub min_scale_distance: f64,
    /// Color of newly created connections and arrows.
    pub default_link_color: SerializableColor,
    /// Stroke width of newly created connections and arrows.
    pub default_link_thickness: f64,
    /// Arrowhead wing length.
    pub arrow_head_size: f64,
    /// Longest side of a newly added image.
    pub max_image_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wheel_step: 0.1,
            handle_hit_tolerance: 12.0,
            element_hit_tolerance: 0.0,
            link_hit_tolerance: 6.0,
            min_scale_distance: 1.0,
            default_link_color: SerializableColor::black(),
            default_link_thickness: 2.0,
            arrow_head_size: 12.0,
            max_image_size: 300.0,
        }
    }
}

impl EditorConfig {
    /// Load overrides from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = EditorConfig::from_json(r#"{ "wheelStep": 0.25, "arrowHeadSize": 20 }"#).unwrap();
        assert_eq!(config.wheel_step, 0.25);
        assert_eq!(config.arrow_head_size, 20.0);
        assert_eq!(config.handle_hit_tolerance, EditorConfig::default().handle_hit_tolerance);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EditorConfig {
            link_hit_tolerance: 9.0,
            ..EditorConfig::default()
        };
        let parsed = EditorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(EditorConfig::from_json("{ wheelStep: }").is_err());
    }
}
