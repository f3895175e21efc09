//! Geometry kernel for rotated, scaled element boxes.
//!
//! Elements are stored as an unrotated, unscaled box (`position`, `width`,
//! `height`). Rotation and scale are both applied visually about the box
//! center, so the center never moves when either changes. Every function here
//! is pure.

use kurbo::{Affine, Point, Rect, Vec2};

/// Below this, a direction vector is treated as zero.
const DIRECTION_EPSILON: f64 = 1e-12;

/// Half-angle between an arrowhead wing and the shaft.
pub const ARROW_WING_ANGLE: f64 = std::f64::consts::FRAC_PI_6;

/// The geometric part of an element, decoupled from its payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementFrame {
    /// Top-left of the unrotated, unscaled box.
    pub position: Point,
    /// Base width.
    pub width: f64,
    /// Base height.
    pub height: f64,
    /// Degrees, clockwise in screen space.
    pub rotation: f64,
    /// Uniform visual scale about the center.
    pub scale: f64,
}

impl ElementFrame {
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Half extents of the visual (scaled) box.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * self.scale / 2.0, self.height * self.scale / 2.0)
    }

    fn is_rotated(&self) -> bool {
        self.rotation % 360.0 != 0.0
    }

    /// Map a canvas point into the element's unrotated frame.
    pub fn to_local(&self, point: Point) -> Point {
        if self.is_rotated() {
            rotate_point(point, self.center(), -self.rotation)
        } else {
            point
        }
    }

    /// Map a point from the element's unrotated frame back to the canvas.
    pub fn to_canvas(&self, point: Point) -> Point {
        if self.is_rotated() {
            rotate_point(point, self.center(), self.rotation)
        } else {
            point
        }
    }

    /// Whether a canvas point falls inside the rotated, scaled box.
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point) - self.center();
        let half = self.half_extents();
        local.x.abs() <= half.x + tolerance && local.y.abs() <= half.y + tolerance
    }

    /// Visual corners in canvas space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let c = self.center();
        let h = self.half_extents();
        [
            Point::new(c.x - h.x, c.y - h.y),
            Point::new(c.x + h.x, c.y - h.y),
            Point::new(c.x + h.x, c.y + h.y),
            Point::new(c.x - h.x, c.y + h.y),
        ]
        .map(|p| self.to_canvas(p))
    }

    /// Axis-aligned bounds of the visual box.
    pub fn bounds(&self) -> Rect {
        let corners = self.corners();
        let mut rect = Rect::from_points(corners[0], corners[1]);
        rect = rect.union_pt(corners[2]);
        rect.union_pt(corners[3])
    }
}

/// Rotate `point` about `center` by `angle_deg` degrees.
pub fn rotate_point(point: Point, center: Point, angle_deg: f64) -> Point {
    Affine::rotate_about(angle_deg.to_radians(), center) * point
}

/// Where a ray from the frame's center toward `target` leaves the visual box.
///
/// The target is taken into the box's local frame, intersected against the
/// scaled half extents, and the hit is rotated back. A target at the center
/// is treated as lying to the right.
pub fn border_intersection(frame: &ElementFrame, target: Point) -> Point {
    let center = frame.center();
    let local_target = frame.to_local(target);

    let delta = local_target - center;
    let length = delta.hypot();
    let dir = if length < DIRECTION_EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        delta / length
    };

    let half = frame.half_extents();
    let tx = if dir.x.abs() > DIRECTION_EPSILON {
        half.x / dir.x.abs()
    } else {
        f64::INFINITY
    };
    let ty = if dir.y.abs() > DIRECTION_EPSILON {
        half.y / dir.y.abs()
    } else {
        f64::INFINITY
    };

    let local_hit = if tx <= ty {
        // vertical edge
        Point::new(center.x + half.x * dir.x.signum(), center.y + dir.y * tx)
    } else {
        // horizontal edge
        Point::new(center.x + dir.x * ty, center.y + half.y * dir.y.signum())
    };

    frame.to_canvas(local_hit)
}

/// Wing points of an arrowhead whose tip is `end`, for a shaft at `angle` radians.
pub fn arrow_head(end: Point, angle: f64, size: f64) -> [Point; 2] {
    let wing = |theta: f64| Point::new(end.x - size * theta.cos(), end.y - size * theta.sin());
    [wing(angle - ARROW_WING_ANGLE), wing(angle + ARROW_WING_ANGLE)]
}

/// Distance from a point to a line segment (a to b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}
