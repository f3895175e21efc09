//! Element definitions for the board.

pub(crate) mod image;
mod mentor;
mod text;

pub use image::{
    Attribution, ImageDescriptor, ImageFormat, ImagePayload, ImageSource, InlineData,
    InlineDataError,
};
pub use mentor::MentorCard;
pub use text::{FontWeight, TextBlock, TextStyle};

use crate::geometry::ElementFrame;
use kurbo::{Point, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest visual scale an element may have.
pub const MIN_SCALE: f64 = 0.2;
/// Largest visual scale an element may have.
pub const MAX_SCALE: f64 = 5.0;

/// Unique identifier for elements.
pub type ElementId = String;

/// Generate a fresh, timestamp-ordered element id.
pub fn new_element_id() -> ElementId {
    Uuid::now_v7().to_string()
}

/// Clamp a requested scale into `[MIN_SCALE, MAX_SCALE]`.
///
/// Non-finite requests collapse to `1.0`.
pub fn clamp_scale(scale: f64) -> f64 {
    if !scale.is_finite() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`).
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Variant tag of an element, as written in persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Image,
    Mentor,
}

impl ElementType {
    /// Default base box for a freshly added element of this type.
    pub fn default_size(&self) -> Size {
        match self {
            ElementType::Text => Size::new(200.0, 50.0),
            ElementType::Image => Size::new(200.0, 200.0),
            ElementType::Mentor => Size::new(220.0, 280.0),
        }
    }
}

/// Type-specific payload of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(TextBlock),
    Image(ImagePayload),
    Mentor(MentorCard),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::Mentor(_) => ElementType::Mentor,
        }
    }

    /// The image carried by this element, if any.
    pub fn image(&self) -> Option<&ImagePayload> {
        match self {
            ElementKind::Text(_) => None,
            ElementKind::Image(image) => Some(image),
            ElementKind::Mentor(card) => card.portrait.as_ref(),
        }
    }
}

/// A positioned, rotatable, uniformly scaled node on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) id: ElementId,
    /// Top-left corner in the unrotated, unscaled frame.
    pub position: Point,
    /// Base width (scale is applied on top of this).
    width: f64,
    /// Base height.
    height: f64,
    /// Rotation in degrees around the element's center.
    pub rotation: f64,
    /// Visual scale around the center, always within `[MIN_SCALE, MAX_SCALE]`.
    scale: f64,
    /// Type-specific payload.
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id and default geometry for its kind.
    pub fn new(position: Point, kind: ElementKind) -> Self {
        let size = kind.element_type().default_size();
        let position = if position.is_finite() {
            position
        } else {
            log::debug!("Non-finite element position {:?}; using origin", position);
            Point::ZERO
        };
        Self {
            id: new_element_id(),
            position,
            width: size.width,
            height: size.height,
            rotation: 0.0,
            scale: 1.0,
            kind,
        }
    }

    /// Rebuild an element with a known id (for loading).
    ///
    /// Invalid sizes fall back to the kind's default and scale is clamped.
    pub(crate) fn reconstruct(
        id: ElementId,
        position: Point,
        width: f64,
        height: f64,
        rotation: f64,
        scale: f64,
        kind: ElementKind,
    ) -> Self {
        let mut element = Self::new(position, kind);
        element.id = id;
        element.set_size(width, height);
        element.rotation = if rotation.is_finite() { rotation } else { 0.0 };
        element.set_scale(scale);
        element
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the base dimensions. Returns false if either is not a positive finite number.
    pub fn set_size(&mut self, width: f64, height: f64) -> bool {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Set the visual scale, clamped into range. Returns the applied value.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        self.scale = clamp_scale(scale);
        self.scale
    }

    /// Move by a delta in canvas coordinates. Returns false, leaving the
    /// element in place, if the result would not be finite.
    pub fn translate(&mut self, delta: Vec2) -> bool {
        let moved = self.position + delta;
        if !moved.is_finite() {
            return false;
        }
        self.position = moved;
        true
    }

    /// Rotate by a quarter turn, keeping the stored angle in `[0, 360)`.
    pub fn rotate_quarter(&mut self, clockwise: bool) {
        let step = if clockwise { 90.0 } else { -90.0 };
        self.rotation = normalize_degrees(self.rotation + step);
    }

    /// Visual center (invariant under scale).
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Geometric frame used by the kernel.
    pub fn frame(&self) -> ElementFrame {
        ElementFrame {
            position: self.position,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Apply a partial update. Fields that don't apply to this kind are ignored.
    pub fn apply_patch(&mut self, patch: ElementPatch) {
        if let Some(position) = patch.position {
            if position.is_finite() {
                self.position = position;
            } else {
                log::debug!("Ignoring non-finite position {:?} for element {}", position, self.id);
            }
        }
        if let Some(size) = patch.size {
            if !self.set_size(size.width, size.height) {
                log::debug!("Ignoring invalid size {:?} for element {}", size, self.id);
            }
        }
        if let Some(rotation) = patch.rotation.filter(|r| r.is_finite()) {
            self.rotation = rotation;
        }
        if let Some(scale) = patch.scale {
            self.set_scale(scale);
        }
        match &mut self.kind {
            ElementKind::Text(block) => {
                if let Some(content) = patch.content {
                    block.content = content;
                }
                if let Some(style) = patch.text_style {
                    block.style = style;
                }
            }
            ElementKind::Image(image) => {
                if let Some(source) = patch.source {
                    image.source = source;
                }
                if let Some(attribution) = patch.attribution {
                    image.attribution = attribution;
                }
            }
            ElementKind::Mentor(card) => {
                if let Some(content) = patch.content {
                    card.content = content;
                }
                if let Some(style) = patch.text_style {
                    card.style = style;
                }
                if let Some(source) = patch.source {
                    let attribution = patch.attribution.flatten();
                    match card.portrait.as_mut() {
                        Some(portrait) => {
                            portrait.source = source;
                            portrait.attribution = attribution;
                        }
                        None => card.portrait = Some(ImagePayload { source, attribution }),
                    }
                } else if let (Some(attribution), Some(portrait)) =
                    (patch.attribution, card.portrait.as_mut())
                {
                    portrait.attribution = attribution;
                }
            }
        }
    }
}

/// Partial element update, merged over the current element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    /// Text or mentor content.
    pub content: Option<String>,
    /// Text or mentor font attributes.
    pub text_style: Option<TextStyle>,
    /// Image or mentor portrait source.
    pub source: Option<ImageSource>,
    /// `Some(None)` clears the attribution.
    pub attribution: Option<Option<Attribution>>,
}

impl ElementPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// What to create when adding an element.
#[derive(Debug, Clone)]
pub enum ElementTemplate {
    Text,
    Image(ImageDescriptor),
    Mentor,
}

impl ElementTemplate {
    /// Build a new element at `position` with type-specific defaults.
    pub fn instantiate(self, position: Point, max_image_size: f64) -> Element {
        match self {
            ElementTemplate::Text => {
                Element::new(position, ElementKind::Text(TextBlock::placeholder()))
            }
            ElementTemplate::Mentor => {
                Element::new(position, ElementKind::Mentor(MentorCard::placeholder()))
            }
            ElementTemplate::Image(descriptor) => {
                let size = descriptor.fitted_size(max_image_size);
                let mut element = Element::new(position, ElementKind::Image(descriptor.into_payload()));
                if let Some(size) = size {
                    element.set_size(size.width, size.height);
                }
                element
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_clamped() {
        let mut element = Element::new(Point::ZERO, ElementKind::Text(TextBlock::placeholder()));
        assert_eq!(element.set_scale(100.0), MAX_SCALE);
        assert_eq!(element.set_scale(0.0001), MIN_SCALE);
        assert_eq!(element.set_scale(-3.0), MIN_SCALE);
        assert_eq!(element.set_scale(f64::NAN), 1.0);
        assert_eq!(element.set_scale(2.5), 2.5);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let mut element = Element::new(Point::ZERO, ElementKind::Text(TextBlock::placeholder()));
        assert!(!element.set_size(0.0, 10.0));
        assert!(!element.set_size(10.0, -1.0));
        assert!(!element.set_size(f64::INFINITY, 10.0));
        assert!(element.set_size(30.0, 40.0));
        assert_eq!(element.width(), 30.0);
        assert_eq!(element.height(), 40.0);
    }

    #[test]
    fn test_non_finite_positions_rejected() {
        let mut element = Element::new(Point::new(f64::NAN, 3.0), ElementKind::Text(TextBlock::placeholder()));
        assert_eq!(element.position, Point::ZERO);

        element.apply_patch(ElementPatch::position(Point::new(1.0, 2.0)));
        element.apply_patch(ElementPatch::position(Point::new(f64::NAN, 0.0)));
        element.apply_patch(ElementPatch::position(Point::new(0.0, f64::NEG_INFINITY)));
        assert_eq!(element.position, Point::new(1.0, 2.0));

        assert!(!element.translate(Vec2::new(f64::INFINITY, 0.0)));
        assert!(element.translate(Vec2::new(1.0, 1.0)));
        assert_eq!(element.position, Point::new(2.0, 3.0));

        let rebuilt = Element::reconstruct(
            "e".into(),
            Point::new(f64::INFINITY, 0.0),
            10.0,
            10.0,
            0.0,
            1.0,
            ElementKind::Text(TextBlock::placeholder()),
        );
        assert_eq!(rebuilt.position, Point::ZERO);
    }

    #[test]
    fn test_rotate_quarter_wraps() {
        let mut element = Element::new(Point::ZERO, ElementKind::Mentor(MentorCard::placeholder()));
        element.rotate_quarter(false);
        assert_eq!(element.rotation, 270.0);
        element.rotate_quarter(true);
        element.rotate_quarter(true);
        assert_eq!(element.rotation, 90.0);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Element::new(Point::ZERO, ElementKind::Text(TextBlock::placeholder()));
        let b = Element::new(Point::ZERO, ElementKind::Text(TextBlock::placeholder()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_patch_ignores_fields_for_other_kinds() {
        let mut element = Element::new(Point::ZERO, ElementKind::Text(TextBlock::placeholder()));
        element.apply_patch(ElementPatch {
            content: Some("hello".into()),
            source: Some(ImageSource::Remote("https://example.com/a.png".into())),
            scale: Some(9.0),
            ..ElementPatch::default()
        });
        match &element.kind {
            ElementKind::Text(block) => assert_eq!(block.content, "hello"),
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(element.scale(), MAX_SCALE);
    }

    #[test]
    fn test_mentor_patch_sets_portrait() {
        let mut element = Element::new(Point::ZERO, ElementKind::Mentor(MentorCard::placeholder()));
        element.apply_patch(ElementPatch {
            source: Some(ImageSource::Remote("https://example.com/m.jpg".into())),
            ..ElementPatch::default()
        });
        let portrait = element.kind.image().expect("portrait");
        assert_eq!(portrait.source, ImageSource::Remote("https://example.com/m.jpg".into()));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(SerializableColor::from_hex("#000000"), Some(SerializableColor::black()));
        assert_eq!(
            SerializableColor::from_hex("#11223380"),
            Some(SerializableColor::new(0x11, 0x22, 0x33, 0x80))
        );
        assert_eq!(SerializableColor::from_hex("red"), None);
        assert_eq!(SerializableColor::new(0x11, 0x22, 0x33, 0x80).to_hex(), "#11223380");
        assert_eq!(SerializableColor::black().to_hex(), "#000000");
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(45.0), 45.0);
    }
}
