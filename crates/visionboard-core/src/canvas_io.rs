//! Board persistence: canvas graphs to and from durable JSON.
//!
//! Session references never reach storage. On save, every session-held image
//! is embedded as base64 `inlineData`; on load, inline data is decoded back
//! into the [`SessionStore`] and the element points at the fresh reference.
//! Images that cannot be resolved get a 1x1 placeholder so rendering never
//! fails on a missing source.

use crate::canvas::{CanvasDocument, CanvasSet};
use crate::elements::{
    Attribution, Element, ElementKind, ElementType, FontWeight, ImagePayload, ImageSource,
    InlineData, InlineDataError, MentorCard, SerializableColor, TextBlock, TextStyle,
};
use crate::links::{Arrow, Connection, LinkStyle};
use crate::session::{SessionBlob, SessionRef, SessionStore, encode_png};
use crate::storage::{Storage, StorageError};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Current persisted format version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors reading or writing a board.
#[derive(Debug, Error)]
pub enum CanvasIoError {
    #[error("Invalid board JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid inline image: {0}")]
    InlineData(#[from] InlineDataError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Unsupported board format version {0}")]
    UnsupportedVersion(u32),
}

pub type CanvasIoResult<T> = Result<T, CanvasIoError>;

fn format_version() -> u32 {
    FORMAT_VERSION
}

fn unit_scale() -> f64 {
    1.0
}

/// A whole board: every canvas of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default = "format_version")]
    pub version: u32,
    #[serde(default)]
    pub canvases: Vec<PersistedCanvas>,
}

impl Default for BoardDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            canvases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCanvas {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: PersistedCanvasData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCanvasData {
    #[serde(default)]
    pub elements: Vec<PersistedElement>,
    #[serde(default)]
    pub connections: Vec<PersistedLink>,
    #[serde(default)]
    pub arrows: Vec<PersistedLink>,
    #[serde(default)]
    pub background_image: Option<PersistedElement>,
}

/// Flat element record. Fields that do not apply to the type are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    /// Text color as CSS hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Stable remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl PersistedElement {
    fn geometry(element: &Element) -> Self {
        Self {
            id: element.id().to_string(),
            element_type: element.element_type(),
            x: element.position.x,
            y: element.position.y,
            width: element.width(),
            height: element.height(),
            rotation: element.rotation,
            scale: element.scale(),
            content: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            color: None,
            source: None,
            attribution: None,
            inline_data: None,
        }
    }

    fn write_text(&mut self, content: &str, style: &TextStyle) {
        self.content = Some(content.to_string());
        self.font_size = Some(style.font_size);
        self.font_family = Some(style.font_family.clone());
        self.font_weight = Some(style.font_weight);
        self.color = Some(style.color.to_hex());
    }

    fn read_style(&self, defaults: TextStyle) -> TextStyle {
        TextStyle {
            font_size: self
                .font_size
                .filter(|size| size.is_finite() && *size > 0.0)
                .unwrap_or(defaults.font_size),
            font_family: self.font_family.clone().unwrap_or(defaults.font_family),
            font_weight: self.font_weight.unwrap_or(defaults.font_weight),
            color: self
                .color
                .as_deref()
                .and_then(SerializableColor::from_hex)
                .unwrap_or(defaults.color),
        }
    }
}

/// Connection or arrow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLink {
    pub id: String,
    pub start_id: String,
    pub end_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PersistedLink {
    fn new(id: &str, start_id: &str, end_id: &str, style: &LinkStyle, data: &Option<Value>) -> Self {
        Self {
            id: id.to_string(),
            start_id: start_id.to_string(),
            end_id: end_id.to_string(),
            color: Some(style.color.to_hex()),
            thickness: Some(style.thickness),
            data: data.clone(),
        }
    }

    fn style(&self) -> LinkStyle {
        let defaults = LinkStyle::default();
        LinkStyle {
            color: self
                .color
                .as_deref()
                .and_then(SerializableColor::from_hex)
                .unwrap_or(defaults.color),
            thickness: self
                .thickness
                .filter(|t| t.is_finite() && *t > 0.0)
                .unwrap_or(defaults.thickness),
        }
    }
}

// --- serialize ---

/// Convert a canvas set into its durable form.
pub fn serialize(canvases: &CanvasSet, sessions: &SessionStore) -> BoardDocument {
    BoardDocument {
        version: FORMAT_VERSION,
        canvases: canvases
            .iter()
            .map(|doc| serialize_canvas(doc, sessions))
            .collect(),
    }
}

pub fn serialize_canvas(doc: &CanvasDocument, sessions: &SessionStore) -> PersistedCanvas {
    PersistedCanvas {
        id: doc.id.clone(),
        name: doc.name.clone(),
        data: PersistedCanvasData {
            elements: doc
                .elements()
                .iter()
                .map(|e| persist_element(e, sessions))
                .collect(),
            connections: doc
                .connections()
                .iter()
                .map(|c| PersistedLink::new(&c.id, &c.start_id, &c.end_id, &c.style, &c.data))
                .collect(),
            arrows: doc
                .arrows()
                .iter()
                .map(|a| PersistedLink::new(&a.id, &a.start_id, &a.end_id, &a.style, &a.data))
                .collect(),
            background_image: doc.background_image().map(|e| persist_element(e, sessions)),
        },
    }
}

fn persist_element(element: &Element, sessions: &SessionStore) -> PersistedElement {
    let mut record = PersistedElement::geometry(element);
    match &element.kind {
        ElementKind::Text(block) => record.write_text(&block.content, &block.style),
        ElementKind::Image(image) => persist_image(&mut record, image, sessions),
        ElementKind::Mentor(card) => {
            record.write_text(&card.content, &card.style);
            if let Some(portrait) = &card.portrait {
                persist_image(&mut record, portrait, sessions);
            }
        }
    }
    record
}

fn persist_image(record: &mut PersistedElement, image: &ImagePayload, sessions: &SessionStore) {
    record.attribution = image.attribution.clone();
    match &image.source {
        ImageSource::Session(reference) => match sessions.get(reference) {
            Some(blob) => {
                record.inline_data = Some(InlineData::encode(
                    blob.bytes(),
                    &blob.mime_type,
                    blob.original_name.clone(),
                ));
            }
            None => log::warn!(
                "Element {} refers to released {}; saving without a source",
                record.id,
                reference
            ),
        },
        ImageSource::Remote(url) if ImageSource::is_session_local_url(url) => {
            log::warn!("Element {} has session-local URL {}; dropping it", record.id, url);
        }
        ImageSource::Remote(url) => record.source = Some(url.clone()),
        ImageSource::Inline(data) => record.inline_data = Some(data.clone()),
    }
}

// --- deserialize ---

/// Canvases rebuilt from storage, plus every session reference created for them.
#[derive(Debug, Default)]
pub struct Deserialized {
    pub canvases: CanvasSet,
    /// Pass to [`dispose`] when the board is closed.
    pub session_refs: Vec<SessionRef>,
}

/// How a persisted image resolved.
enum Resolved {
    Source(ImageSource),
    /// Something was recorded but could not be used.
    Failed,
    Absent,
}

/// Decode inline data into the session arena.
pub fn materialize(inline: &InlineData, sessions: &mut SessionStore) -> CanvasIoResult<SessionRef> {
    let bytes = inline.decode()?;
    Ok(sessions.register(SessionBlob::new(
        bytes,
        &inline.mime_type,
        inline.original_name.clone(),
    )))
}

/// Rebuild canvases, decoding inline images into `sessions`.
pub fn deserialize(document: BoardDocument, sessions: &mut SessionStore) -> CanvasIoResult<Deserialized> {
    if document.version > FORMAT_VERSION {
        return Err(CanvasIoError::UnsupportedVersion(document.version));
    }
    let mut session_refs = Vec::new();
    let docs = document
        .canvases
        .into_iter()
        .map(|canvas| restore_canvas(canvas, sessions, &mut session_refs))
        .collect();
    Ok(Deserialized {
        canvases: CanvasSet::from_documents(docs),
        session_refs,
    })
}

fn restore_canvas(
    canvas: PersistedCanvas,
    sessions: &mut SessionStore,
    refs: &mut Vec<SessionRef>,
) -> CanvasDocument {
    let data = canvas.data;
    let elements = data
        .elements
        .into_iter()
        .map(|record| restore_element(record, sessions, refs))
        .collect();
    let connections = data
        .connections
        .into_iter()
        .map(|record| {
            let mut connection = Connection::new(record.start_id.clone(), record.end_id.clone(), record.style());
            connection.id = record.id;
            connection.data = record.data;
            connection
        })
        .collect();
    let arrows = data
        .arrows
        .into_iter()
        .map(|record| {
            let mut arrow = Arrow::new(record.start_id.clone(), record.end_id.clone(), record.style());
            arrow.id = record.id;
            arrow.data = record.data;
            arrow
        })
        .collect();
    let background_image = data
        .background_image
        .map(|record| restore_element(record, sessions, refs));

    CanvasDocument::from_parts(canvas.id, canvas.name, elements, connections, arrows, background_image)
}

fn restore_element(
    record: PersistedElement,
    sessions: &mut SessionStore,
    refs: &mut Vec<SessionRef>,
) -> Element {
    let kind = match record.element_type {
        ElementType::Text => ElementKind::Text(TextBlock {
            content: record.content.clone().unwrap_or_default(),
            style: record.read_style(TextStyle::default()),
        }),
        ElementType::Image => {
            let source = match resolve_image(&record, sessions, refs) {
                Resolved::Source(source) => source,
                Resolved::Failed | Resolved::Absent => {
                    log::warn!("Image element {} has no usable source; using placeholder", record.id);
                    placeholder(sessions, refs)
                }
            };
            ElementKind::Image(ImagePayload {
                source,
                attribution: record.attribution.clone(),
            })
        }
        ElementType::Mentor => {
            let portrait = match resolve_image(&record, sessions, refs) {
                Resolved::Source(source) => Some(source),
                Resolved::Failed => {
                    log::warn!("Mentor {} portrait unreadable; using placeholder", record.id);
                    Some(placeholder(sessions, refs))
                }
                Resolved::Absent => None,
            };
            ElementKind::Mentor(MentorCard {
                content: record.content.clone().unwrap_or_default(),
                style: record.read_style(MentorCard::placeholder().style),
                portrait: portrait.map(|source| ImagePayload {
                    source,
                    attribution: record.attribution.clone(),
                }),
            })
        }
    };

    Element::reconstruct(
        record.id,
        Point::new(record.x, record.y),
        record.width,
        record.height,
        record.rotation,
        record.scale,
        kind,
    )
}

fn resolve_image(
    record: &PersistedElement,
    sessions: &mut SessionStore,
    refs: &mut Vec<SessionRef>,
) -> Resolved {
    if let Some(inline) = &record.inline_data {
        return match materialize(inline, sessions) {
            Ok(reference) => {
                refs.push(reference.clone());
                Resolved::Source(ImageSource::Session(reference))
            }
            Err(e) => {
                log::warn!("Element {}: {}", record.id, e);
                Resolved::Failed
            }
        };
    }

    match record.source.as_deref() {
        None | Some("") => Resolved::Absent,
        Some(url) if url.starts_with("data:") => {
            match InlineData::from_data_url(url)
                .map_err(CanvasIoError::from)
                .and_then(|inline| materialize(&inline, sessions))
            {
                Ok(reference) => {
                    refs.push(reference.clone());
                    Resolved::Source(ImageSource::Session(reference))
                }
                Err(e) => {
                    log::warn!("Element {}: {}", record.id, e);
                    Resolved::Failed
                }
            }
        }
        Some(url) if ImageSource::is_session_local_url(url) => {
            log::warn!("Element {} kept a stale session URL {}", record.id, url);
            Resolved::Failed
        }
        Some(url) => Resolved::Source(ImageSource::Remote(url.to_string())),
    }
}

fn placeholder(sessions: &mut SessionStore, refs: &mut Vec<SessionRef>) -> ImageSource {
    let reference = sessions.register_placeholder();
    refs.push(reference.clone());
    ImageSource::Session(reference)
}

/// Release every session reference created by [`deserialize`].
pub fn dispose(sessions: &mut SessionStore, session_refs: &[SessionRef]) -> usize {
    sessions.dispose(session_refs)
}

// --- JSON and storage ---

pub fn to_json(document: &BoardDocument) -> CanvasIoResult<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a stored board.
///
/// Boards written before the version wrapper were a bare canvas array; both
/// forms are accepted.
pub fn from_json(json: &str) -> CanvasIoResult<BoardDocument> {
    if json.trim_start().starts_with('[') {
        let canvases: Vec<PersistedCanvas> = serde_json::from_str(json)?;
        return Ok(BoardDocument {
            version: FORMAT_VERSION,
            canvases,
        });
    }
    Ok(serde_json::from_str(json)?)
}

/// The serialized board as JSON text.
pub fn export_graph(canvases: &CanvasSet, sessions: &SessionStore) -> CanvasIoResult<String> {
    to_json(&serialize(canvases, sessions))
}

/// Result of loading a board from storage.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub deserialized: Deserialized,
    /// Set when the stored board existed but could not be read. The canvas
    /// set is empty in that case so the editor stays usable.
    pub error: Option<CanvasIoError>,
}

/// Load and deserialize the board stored under `key`.
///
/// Never fails: a missing board yields an empty set, and an unreadable one
/// yields an empty set plus the error.
pub async fn load_canvases<S: Storage + ?Sized>(
    storage: &S,
    key: &str,
    sessions: &mut SessionStore,
) -> LoadOutcome {
    let json = match storage.load(key).await {
        Ok(json) => json,
        Err(StorageError::NotFound(_)) => {
            log::info!("No board stored under {}; starting empty", key);
            return LoadOutcome::default();
        }
        Err(e) => {
            log::error!("Failed to load board {}: {}", key, e);
            return LoadOutcome {
                deserialized: Deserialized::default(),
                error: Some(e.into()),
            };
        }
    };

    match from_json(&json).and_then(|board| deserialize(board, sessions)) {
        Ok(deserialized) => {
            log::info!("Loaded {} canvases from {}", deserialized.canvases.len(), key);
            LoadOutcome {
                deserialized,
                error: None,
            }
        }
        Err(e) => {
            log::error!("Board {} is unreadable: {}", key, e);
            LoadOutcome {
                deserialized: Deserialized::default(),
                error: Some(e),
            }
        }
    }
}

/// Serialize `canvases` and overwrite the board stored under `key`.
pub async fn save_canvases<S: Storage + ?Sized>(
    storage: &S,
    key: &str,
    canvases: &CanvasSet,
    sessions: &SessionStore,
) -> CanvasIoResult<()> {
    let json = export_graph(canvases, sessions)?;
    if let Err(e) = storage.save(key, &json).await {
        log::error!("Failed to save board {}: {}", key, e);
        return Err(e.into());
    }
    log::info!("Saved {} canvases to {}", canvases.len(), key);
    Ok(())
}

// --- raster export ---

/// Errors producing a raster image of a canvas.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Canvas is empty")]
    EmptyCanvas,
    #[error("Renderer failed: {0}")]
    Render(String),
    #[error("Pixel buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// RGBA8 pixels produced by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Draws a canvas into pixels. Implemented by the rendering layer.
pub trait RasterRenderer {
    /// Render the region `bounds` (canvas coordinates) of `document`.
    fn render(
        &self,
        document: &CanvasDocument,
        sessions: &SessionStore,
        bounds: Rect,
    ) -> Result<RasterImage, ExportError>;
}

/// Render a canvas through `renderer` and encode it as PNG bytes.
pub fn export_raster(
    document: &CanvasDocument,
    sessions: &SessionStore,
    renderer: &dyn RasterRenderer,
) -> Result<Vec<u8>, ExportError> {
    let bounds = document.bounds().ok_or(ExportError::EmptyCanvas)?;
    let image = renderer.render(document, sessions, bounds)?;
    let expected = image.width as usize * image.height as usize * 4;
    if image.rgba.len() != expected || expected == 0 {
        return Err(ExportError::BufferSize {
            expected,
            actual: image.rgba.len(),
        });
    }
    let png = encode_png(&image.rgba, image.width, image.height)?;
    log::info!("Raster export: {}x{}, {} bytes", image.width, image.height, png.len());
    Ok(png)
}
