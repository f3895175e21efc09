//! Connections (undirected) and arrows (directed) between elements.

use crate::elements::{ElementId, SerializableColor};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for connections and arrows.
pub type LinkId = String;

/// Generate a fresh, timestamp-ordered link id.
pub fn new_link_id() -> LinkId {
    Uuid::now_v7().to_string()
}

/// Stroke used to draw a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkStyle {
    pub color: SerializableColor,
    pub thickness: f64,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            thickness: 2.0,
        }
    }
}

/// An edge between two elements.
pub trait Link {
    fn id(&self) -> &str;
    fn start_id(&self) -> &str;
    fn end_id(&self) -> &str;

    /// Whether either endpoint is `element_id`.
    fn touches(&self, element_id: &str) -> bool {
        self.start_id() == element_id || self.end_id() == element_id
    }
}

/// An undirected visual edge. At most one exists per unordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub(crate) id: LinkId,
    pub start_id: ElementId,
    pub end_id: ElementId,
    pub style: LinkStyle,
    /// Free-form payload attached by the UI.
    pub data: Option<Value>,
}

impl Connection {
    pub fn new(start_id: impl Into<ElementId>, end_id: impl Into<ElementId>, style: LinkStyle) -> Self {
        Self {
            id: new_link_id(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            style,
            data: None,
        }
    }

    /// Whether this connection joins `a` and `b`, in either order.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.start_id == a && self.end_id == b) || (self.start_id == b && self.end_id == a)
    }
}

impl Link for Connection {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_id(&self) -> &str {
        &self.start_id
    }

    fn end_id(&self) -> &str {
        &self.end_id
    }
}

/// A directed edge, drawn with a head at `end_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub(crate) id: LinkId,
    pub start_id: ElementId,
    pub end_id: ElementId,
    pub style: LinkStyle,
    pub data: Option<Value>,
}

impl Arrow {
    pub fn new(start_id: impl Into<ElementId>, end_id: impl Into<ElementId>, style: LinkStyle) -> Self {
        Self {
            id: new_link_id(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            style,
            data: None,
        }
    }
}

impl Link for Arrow {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_id(&self) -> &str {
        &self.start_id
    }

    fn end_id(&self) -> &str {
        &self.end_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_joins_either_order() {
        let c = Connection::new("a", "b", LinkStyle::default());
        assert!(c.joins("a", "b"));
        assert!(c.joins("b", "a"));
        assert!(!c.joins("a", "c"));
    }

    #[test]
    fn test_touches() {
        let arrow = Arrow::new("a", "b", LinkStyle::default());
        assert!(arrow.touches("a"));
        assert!(arrow.touches("b"));
        assert!(!arrow.touches("c"));
    }
}
