//! Anchor points for connections and arrows.

use crate::elements::{Element, ElementId};
use crate::geometry::{ElementFrame, border_intersection};
use crate::links::Link;
use kurbo::{Point, Size};
use std::collections::HashMap;

/// Where a link is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkCoordinates {
    pub start: Point,
    pub end: Point,
    /// Angle of the segment from start to end, in radians (for arrowheads).
    pub angle: f64,
}

/// Computes link endpoints from element geometry.
///
/// Holds a disposable cache of live-measured element sizes. A cached size only
/// overrides the stored base size when the two differ, which happens for
/// elements whose rendered size depends on their content.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    measured: HashMap<ElementId, Size>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live measurement reported by the rendering layer.
    pub fn record_measurement(&mut self, id: impl Into<ElementId>, width: f64, height: f64) {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            self.measured.insert(id.into(), Size::new(width, height));
        }
    }

    /// Drop the cached measurement for an element.
    pub fn forget(&mut self, id: &str) {
        self.measured.remove(id);
    }

    /// Drop cached measurements for elements no longer in `elements`.
    pub fn retain_present(&mut self, elements: &[Element]) {
        self.measured
            .retain(|id, _| elements.iter().any(|element| element.id() == id.as_str()));
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }

    pub fn measured_size(&self, id: &str) -> Option<Size> {
        self.measured.get(id).copied()
    }

    /// The frame used for link math, with any measured size applied.
    pub fn frame_for(&self, element: &Element) -> ElementFrame {
        let mut frame = element.frame();
        if let Some(size) = self.measured.get(element.id()) {
            if size.width != frame.width || size.height != frame.height {
                frame.width = size.width;
                frame.height = size.height;
            }
        }
        frame
    }

    /// Endpoints of a permanent link, or `None` if either element is missing.
    pub fn coordinates_for(&self, elements: &[Element], link: &impl Link) -> Option<LinkCoordinates> {
        let start = find(elements, link.start_id());
        let end = find(elements, link.end_id());
        let (Some(start), Some(end)) = (start, end) else {
            log::debug!("Link {} has a dangling endpoint", link.id());
            return None;
        };

        let start_frame = self.frame_for(start);
        let end_frame = self.frame_for(end);
        let start_point = border_intersection(&start_frame, end_frame.center());
        let end_point = border_intersection(&end_frame, start_frame.center());
        let angle = (end_point.y - start_point.y).atan2(end_point.x - start_point.x);

        Some(LinkCoordinates {
            start: start_point,
            end: end_point,
            angle,
        })
    }

    /// Start point of a link still being dragged toward the cursor.
    pub fn temp_coordinates_for(&self, start: &Element, cursor: Point) -> Point {
        border_intersection(&self.frame_for(start), cursor)
    }
}

fn find<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
    elements.iter().find(|element| element.id() == id)
}
