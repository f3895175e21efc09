//! Selection, interaction modes and corner handles.

use crate::elements::ElementId;
use crate::geometry::ElementFrame;
use crate::links::LinkId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// What is currently selected. At most one thing at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Element(ElementId),
    Connection(LinkId),
    Arrow(LinkId),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn element(&self) -> Option<&str> {
        match self {
            Selection::Element(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&str> {
        match self {
            Selection::Connection(id) => Some(id),
            _ => None,
        }
    }

    pub fn arrow(&self) -> Option<&str> {
        match self {
            Selection::Arrow(id) => Some(id),
            _ => None,
        }
    }
}

/// Corner positions of an element's visual box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// In the same order as [`ElementFrame::corners`].
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];
}

/// A scale handle and its position in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Check if a point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// The four scale handles at the visual corners of an element.
pub fn corner_handles(frame: &ElementFrame) -> [Handle; 4] {
    let corners = frame.corners();
    let mut i = 0;
    Corner::ALL.map(|corner| {
        let handle = Handle {
            position: corners[i],
            corner,
        };
        i += 1;
        handle
    })
}

/// Find which corner handle (if any) is under `point`.
pub fn hit_test_corner(frame: &ElementFrame, point: Point, tolerance: f64) -> Option<Corner> {
    corner_handles(frame)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.corner)
}

/// An element being moved by the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub element_id: ElementId,
    /// Pointer position relative to the element's top-left when the drag began.
    pub grab_offset: Vec2,
    /// Pointer position at the previous move.
    pub last_pointer: Point,
    /// Set once the element has actually moved.
    pub changed: bool,
}

/// An element being scaled from one of its corners.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleState {
    pub element_id: ElementId,
    pub corner: Corner,
    /// Visual center of the element when the gesture began.
    pub center: Point,
    pub initial_scale: f64,
    pub initial_width: f64,
    pub initial_height: f64,
    /// Pointer distance from `center` at press time (already guarded against zero).
    pub initial_distance: f64,
    /// Set once the element's scale has actually changed.
    pub changed: bool,
}

impl ScaleState {
    /// Scale for a pointer at `point`, before clamping.
    pub fn scale_at(&self, point: Point) -> f64 {
        let distance = (point - self.center).hypot();
        self.initial_scale * distance / self.initial_distance
    }
}

/// The single active interaction mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging(DragState),
    Scaling(ScaleState),
    /// Dragging out an undirected connection from `source`.
    Connecting { source: ElementId },
    /// Dragging out an arrow from `source`.
    ArrowCreating { source: ElementId },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    /// The element the current gesture is anchored to.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            InteractionMode::Idle => None,
            InteractionMode::Dragging(drag) => Some(&drag.element_id),
            InteractionMode::Scaling(scale) => Some(&scale.element_id),
            InteractionMode::Connecting { source } | InteractionMode::ArrowCreating { source } => {
                Some(source)
            }
        }
    }

    /// Whether a link is being dragged out.
    pub fn is_creating_link(&self) -> bool {
        matches!(
            self,
            InteractionMode::Connecting { .. } | InteractionMode::ArrowCreating { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Dragging(_) => "dragging",
            InteractionMode::Scaling(_) => "scaling",
            InteractionMode::Connecting { .. } => "connecting",
            InteractionMode::ArrowCreating { .. } => "arrow-creating",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rotation: f64, scale: f64) -> ElementFrame {
        ElementFrame {
            position: Point::new(0.0, 0.0),
            width: 100.0,
            height: 50.0,
            rotation,
            scale,
        }
    }

    #[test]
    fn test_corner_handles_follow_scale() {
        let handles = corner_handles(&frame(0.0, 2.0));
        // center (50, 25), scaled half extents (100, 50)
        assert_eq!(handles[0].position, Point::new(-50.0, -25.0));
        assert_eq!(handles[0].corner, Corner::TopLeft);
        assert_eq!(handles[2].position, Point::new(150.0, 75.0));
        assert_eq!(handles[2].corner, Corner::BottomRight);
    }

    #[test]
    fn test_hit_test_corner() {
        let f = frame(0.0, 1.0);
        assert_eq!(hit_test_corner(&f, Point::new(101.0, 49.0), 5.0), Some(Corner::BottomRight));
        assert_eq!(hit_test_corner(&f, Point::new(0.0, 50.0), 5.0), Some(Corner::BottomLeft));
        assert_eq!(hit_test_corner(&f, Point::new(50.0, 25.0), 5.0), None);
    }

    #[test]
    fn test_hit_test_corner_rotated() {
        // Rotated 90 degrees: top-left corner lands at (75, -25)
        let f = frame(90.0, 1.0);
        assert_eq!(hit_test_corner(&f, Point::new(75.0, -25.0), 1.0), Some(Corner::TopLeft));
    }

    #[test]
    fn test_scale_at_ratio() {
        let state = ScaleState {
            element_id: "a".into(),
            corner: Corner::BottomRight,
            center: Point::ZERO,
            initial_scale: 1.5,
            initial_width: 100.0,
            initial_height: 100.0,
            initial_distance: 10.0,
            changed: false,
        };
        assert!((state.scale_at(Point::new(20.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mode_anchor() {
        assert_eq!(InteractionMode::Idle.anchor(), None);
        let mode = InteractionMode::Connecting { source: "a".into() };
        assert_eq!(mode.anchor(), Some("a"));
        assert!(mode.is_creating_link());
        assert_eq!(mode.name(), "connecting");
    }

    #[test]
    fn test_selection_accessors() {
        let selection = Selection::Arrow("x".into());
        assert_eq!(selection.arrow(), Some("x"));
        assert_eq!(selection.element(), None);
        assert!(!selection.is_none());
    }
}
