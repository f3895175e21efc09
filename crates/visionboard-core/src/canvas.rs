//! Canvas documents and the element/connection store.

use crate::config::EditorConfig;
use crate::connection_manager::{ConnectionManager, LinkCoordinates};
use crate::elements::{
    Attribution, Element, ElementId, ElementKind, ElementPatch, ElementTemplate, ImagePayload,
    ImageSource, clamp_scale,
};
use crate::geometry::{arrow_head, point_to_segment_dist};
use crate::links::{Arrow, Connection, Link, LinkId, LinkStyle};
use crate::selection::{
    Corner, DragState, InteractionMode, ScaleState, Selection, hit_test_corner,
};
use kurbo::{Point, Rect, Vec2};
use uuid::Uuid;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// A snapshot of document state for undo/redo.
#[derive(Debug, Clone)]
struct DocumentSnapshot {
    elements: Vec<Element>,
    connections: Vec<Connection>,
    arrows: Vec<Arrow>,
    background_image: Option<Element>,
}

/// One canvas: its element graph plus undo history.
///
/// Elements are kept in paint order (back to front). All mutation goes
/// through [`Canvas`], which keeps selection and gesture state consistent.
#[derive(Debug, Clone)]
pub struct CanvasDocument {
    /// Unique document identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    elements: Vec<Element>,
    connections: Vec<Connection>,
    arrows: Vec<Arrow>,
    background_image: Option<Element>,
    undo_stack: Vec<DocumentSnapshot>,
    redo_stack: Vec<DocumentSnapshot>,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::named("Untitled")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            elements: Vec::new(),
            connections: Vec::new(),
            arrows: Vec::new(),
            background_image: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Assemble a document from loaded parts.
    ///
    /// Duplicate element ids keep their first occurrence. Self-loops and
    /// repeated undirected connections are dropped.
    pub(crate) fn from_parts(
        id: String,
        name: String,
        elements: Vec<Element>,
        connections: Vec<Connection>,
        arrows: Vec<Arrow>,
        background_image: Option<Element>,
    ) -> Self {
        let mut doc = Self::named(name);
        doc.id = id;
        for element in elements {
            if doc.contains_element(element.id()) {
                log::warn!("Dropping duplicate element id {} in canvas {}", element.id(), doc.id);
                continue;
            }
            doc.elements.push(element);
        }
        for connection in connections {
            if connection.start_id == connection.end_id
                || doc.has_connection_between(&connection.start_id, &connection.end_id)
            {
                log::warn!("Dropping redundant connection {} in canvas {}", connection.id, doc.id);
                continue;
            }
            doc.connections.push(connection);
        }
        doc.arrows = arrows;
        doc.background_image = background_image;
        doc
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            elements: self.elements.clone(),
            connections: self.connections.clone(),
            arrows: self.arrows.clone(),
            background_image: self.background_image.clone(),
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.elements = snapshot.elements;
        self.connections = snapshot.connections;
        self.arrows = snapshot.arrows;
        self.background_image = snapshot.background_image;
    }

    /// Push current state to the undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Elements in paint order (back to front).
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub(crate) fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains_element(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id() == id)
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn arrow(&self, id: &str) -> Option<&Arrow> {
        self.arrows.iter().find(|a| a.id() == id)
    }

    pub fn background_image(&self) -> Option<&Element> {
        self.background_image.as_ref()
    }

    /// Whether an undirected connection already joins `a` and `b`.
    pub fn has_connection_between(&self, a: &str, b: &str) -> bool {
        self.connections.iter().any(|c| c.joins(a, b))
    }

    fn insert_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Remove an element and every link touching it.
    fn remove_element(&mut self, id: &str) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        let element = self.elements.remove(index);
        self.connections.retain(|c| !c.touches(id));
        self.arrows.retain(|a| !a.touches(id));
        Some(element)
    }

    fn remove_connection(&mut self, id: &str) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id() == id)?;
        Some(self.connections.remove(index))
    }

    fn remove_arrow(&mut self, id: &str) -> Option<Arrow> {
        let index = self.arrows.iter().position(|a| a.id() == id)?;
        Some(self.arrows.remove(index))
    }

    fn move_element(&mut self, id: &str, to_front: bool) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id() == id) else {
            return false;
        };
        let element = self.elements.remove(index);
        if to_front {
            self.elements.push(element);
        } else {
            self.elements.insert(0, element);
        }
        true
    }

    /// Bounding box of all elements' visual boxes.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements
            .iter()
            .map(|e| e.frame().bounds())
            .reduce(|acc, r| acc.union(r))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// An ordered collection of canvases, as stored in one board document.
#[derive(Debug, Clone, Default)]
pub struct CanvasSet {
    canvases: Vec<CanvasDocument>,
}

impl CanvasSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(canvases: Vec<CanvasDocument>) -> Self {
        Self { canvases }
    }

    /// Add an empty canvas and return its id.
    pub fn add(&mut self, name: impl Into<String>) -> String {
        let doc = CanvasDocument::named(name);
        let id = doc.id.clone();
        self.canvases.push(doc);
        id
    }

    /// Insert a document, replacing any canvas with the same id in place.
    pub fn insert(&mut self, doc: CanvasDocument) {
        match self.canvases.iter_mut().find(|c| c.id == doc.id) {
            Some(existing) => *existing = doc,
            None => self.canvases.push(doc),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CanvasDocument> {
        let index = self.canvases.iter().position(|c| c.id == id)?;
        Some(self.canvases.remove(index))
    }

    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(doc) => {
                doc.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&CanvasDocument> {
        self.canvases.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CanvasDocument> {
        self.canvases.iter_mut().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanvasDocument> {
        self.canvases.iter()
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    pub fn into_documents(self) -> Vec<CanvasDocument> {
        self.canvases
    }
}

/// A link found by a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkHit {
    Connection(LinkId),
    Arrow(LinkId),
}

/// A link being dragged out from `source` toward the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempLink {
    pub start: Point,
    pub end: Point,
    /// Whether the finished link will be an arrow.
    pub directed: bool,
}

/// The authoritative element/connection store for one open canvas.
///
/// Owns the document, the single selection, the single interaction mode and
/// the connection manager's measurement cache.
#[derive(Debug, Clone)]
pub struct Canvas {
    document: CanvasDocument,
    selection: Selection,
    mode: InteractionMode,
    config: EditorConfig,
    connection_manager: ConnectionManager,
    cursor: Option<Point>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new canvas with an empty document.
    pub fn new() -> Self {
        Self::with_document(CanvasDocument::new())
    }

    /// Create a canvas with an existing document.
    pub fn with_document(document: CanvasDocument) -> Self {
        Self {
            document,
            selection: Selection::None,
            mode: InteractionMode::Idle,
            config: EditorConfig::default(),
            connection_manager: ConnectionManager::new(),
            cursor: None,
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    /// Close the canvas, handing the document back.
    pub fn into_document(self) -> CanvasDocument {
        self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.document.element(id)
    }

    fn link_style(&self) -> LinkStyle {
        LinkStyle {
            color: self.config.default_link_color,
            thickness: self.config.default_link_thickness,
        }
    }

    // --- elements ---

    /// Add a new element and select it.
    pub fn add_element(&mut self, template: ElementTemplate, position: Point) -> ElementId {
        let element = template.instantiate(position, self.config.max_image_size);
        let id = element.id().to_string();
        self.document.push_undo();
        self.document.insert_element(element);
        self.mode = InteractionMode::Idle;
        self.selection = Selection::Element(id.clone());
        log::debug!("Added element {}", id);
        id
    }

    /// Merge a patch into an element. Returns false if the id is unknown.
    pub fn update_element(&mut self, id: &str, patch: ElementPatch) -> bool {
        if !self.document.contains_element(id) {
            log::debug!("update_element: no element {}", id);
            return false;
        }
        self.document.push_undo();
        if let Some(element) = self.document.element_mut(id) {
            element.apply_patch(patch);
        }
        true
    }

    /// Set an element's base dimensions without touching its scale.
    ///
    /// The stored size becomes authoritative, so any cached measurement for
    /// the element is dropped.
    pub fn update_element_size(&mut self, id: &str, width: f64, height: f64) -> bool {
        let Some(element) = self.document.element_mut(id) else {
            log::debug!("update_element_size: no element {}", id);
            return false;
        };
        if !element.set_size(width, height) {
            log::debug!("update_element_size: rejected {}x{} for {}", width, height, id);
            return false;
        }
        self.connection_manager.forget(id);
        true
    }

    /// Record a size measured by the rendering layer for link math.
    pub fn record_measurement(&mut self, id: &str, width: f64, height: f64) {
        if self.document.contains_element(id) {
            self.connection_manager.record_measurement(id, width, height);
        }
    }

    /// Delete an element and every connection or arrow touching it.
    pub fn delete_element(&mut self, id: &str) -> bool {
        if !self.document.contains_element(id) {
            log::debug!("delete_element: no element {}", id);
            return false;
        }
        self.document.push_undo();
        self.document.remove_element(id);
        self.connection_manager.forget(id);
        self.drop_dangling_state();
        true
    }

    /// Rotate an element a quarter turn.
    pub fn rotate_element(&mut self, id: &str, clockwise: bool) -> bool {
        if !self.document.contains_element(id) {
            return false;
        }
        self.document.push_undo();
        if let Some(element) = self.document.element_mut(id) {
            element.rotate_quarter(clockwise);
        }
        true
    }

    pub fn bring_to_front(&mut self, id: &str) -> bool {
        self.reorder(id, true)
    }

    pub fn send_to_back(&mut self, id: &str) -> bool {
        self.reorder(id, false)
    }

    fn reorder(&mut self, id: &str, to_front: bool) -> bool {
        if !self.document.contains_element(id) {
            return false;
        }
        self.document.push_undo();
        self.document.move_element(id, to_front)
    }

    /// Replace the background image.
    pub fn set_background_image(&mut self, source: ImageSource, attribution: Option<Attribution>) {
        self.document.push_undo();
        let payload = ImagePayload { source, attribution };
        self.document.background_image = Some(Element::new(Point::ZERO, ElementKind::Image(payload)));
    }

    pub fn clear_background_image(&mut self) -> Option<Element> {
        if self.document.background_image.is_none() {
            return None;
        }
        self.document.push_undo();
        self.document.background_image.take()
    }

    // --- drag ---

    /// Begin moving an element. Cancels any other mode and selects the element.
    ///
    /// The undo snapshot is taken on the first real move, so a plain click
    /// leaves the history untouched.
    pub fn start_drag(&mut self, id: &str, pointer: Point) -> bool {
        let Some(element) = self.document.element(id) else {
            return false;
        };
        let grab_offset = pointer - element.position;
        self.selection = Selection::Element(id.to_string());
        self.mode = InteractionMode::Dragging(DragState {
            element_id: id.to_string(),
            grab_offset,
            last_pointer: pointer,
            changed: false,
        });
        true
    }

    /// Move the dragged element by the pointer delta since the last move.
    pub fn update_drag(&mut self, pointer: Point) -> bool {
        let InteractionMode::Dragging(drag) = &mut self.mode else {
            return false;
        };
        let delta = pointer - drag.last_pointer;
        if !delta.is_finite() {
            log::debug!("Ignoring non-finite drag pointer {:?}", pointer);
            return false;
        }
        if delta == Vec2::ZERO {
            return true;
        }
        drag.last_pointer = pointer;
        let first_move = !std::mem::replace(&mut drag.changed, true);
        let id = drag.element_id.clone();
        if !self.document.contains_element(&id) {
            self.mode = InteractionMode::Idle;
            return false;
        }
        if first_move {
            self.document.push_undo();
        }
        self.document
            .element_mut(&id)
            .is_some_and(|element| element.translate(delta))
    }

    pub fn end_drag(&mut self) -> bool {
        if matches!(self.mode, InteractionMode::Dragging(_)) {
            self.mode = InteractionMode::Idle;
            true
        } else {
            false
        }
    }

    // --- scale ---

    /// Begin scaling an element from one of its corners.
    pub fn start_scale(&mut self, id: &str, corner: Corner, pointer: Point) -> bool {
        let Some(element) = self.document.element(id) else {
            return false;
        };
        let center = element.center();
        let distance = (pointer - center).hypot();
        let state = ScaleState {
            element_id: id.to_string(),
            corner,
            center,
            initial_scale: element.scale(),
            initial_width: element.width(),
            initial_height: element.height(),
            initial_distance: distance.max(self.config.min_scale_distance).max(f64::EPSILON),
            changed: false,
        };
        self.selection = Selection::Element(id.to_string());
        self.mode = InteractionMode::Scaling(state);
        true
    }

    /// Rescale from the pointer's distance to the element center. Returns the applied scale.
    pub fn update_scale(&mut self, pointer: Point) -> Option<f64> {
        let InteractionMode::Scaling(state) = &mut self.mode else {
            return None;
        };
        if !pointer.is_finite() {
            log::debug!("Ignoring non-finite scale pointer {:?}", pointer);
            return None;
        }
        let requested = clamp_scale(state.scale_at(pointer));
        let id = state.element_id.clone();
        let Some(current) = self.document.element(&id).map(Element::scale) else {
            self.mode = InteractionMode::Idle;
            return None;
        };
        if requested == current {
            return Some(current);
        }
        if !std::mem::replace(&mut state.changed, true) {
            self.document.push_undo();
        }
        self.document
            .element_mut(&id)
            .map(|element| element.set_scale(requested))
    }

    pub fn end_scale(&mut self) -> bool {
        if matches!(self.mode, InteractionMode::Scaling(_)) {
            self.mode = InteractionMode::Idle;
            true
        } else {
            false
        }
    }

    /// Multiply the selected element's scale by one wheel step per notch.
    ///
    /// Only applies while idle with an element selected.
    pub fn wheel_scale(&mut self, notches: f64) -> Option<f64> {
        if !self.mode.is_idle() || notches == 0.0 || !notches.is_finite() {
            return None;
        }
        let id = self.selection.element()?.to_string();
        let step = self.config.wheel_step;
        let factor = if notches > 0.0 {
            (1.0 + step).powf(notches)
        } else {
            (1.0 - step).powf(-notches)
        };
        let current = self.document.element(&id)?.scale();
        self.document.push_undo();
        self.document
            .element_mut(&id)
            .map(|element| element.set_scale(current * factor))
    }

    // --- links ---

    /// Start dragging out a connection from `source`.
    pub fn start_connecting(&mut self, source: &str) -> bool {
        self.start_link(source, false)
    }

    /// Start dragging out an arrow from `source`.
    pub fn start_arrow(&mut self, source: &str) -> bool {
        self.start_link(source, true)
    }

    fn start_link(&mut self, source: &str, directed: bool) -> bool {
        if !self.document.contains_element(source) {
            return false;
        }
        let source = source.to_string();
        self.selection = Selection::Element(source.clone());
        self.mode = if directed {
            InteractionMode::ArrowCreating { source }
        } else {
            InteractionMode::Connecting { source }
        };
        true
    }

    /// Finish the link being dragged out at `target`.
    ///
    /// Returns to idle either way. Clicking the source itself cancels.
    pub fn complete_link(&mut self, target: &str) -> Option<LinkId> {
        let mode = std::mem::take(&mut self.mode);
        match mode {
            InteractionMode::Connecting { source } => self.create_connection(&source, target),
            InteractionMode::ArrowCreating { source } => self.create_arrow(&source, target),
            other => {
                self.mode = other;
                None
            }
        }
    }

    /// Return to idle without changing the document.
    pub fn cancel_mode(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    /// Connect two elements. No-op for self-loops, unknown ids or an existing pair.
    pub fn create_connection(&mut self, start_id: &str, end_id: &str) -> Option<LinkId> {
        if !self.can_link(start_id, end_id) {
            return None;
        }
        if self.document.has_connection_between(start_id, end_id) {
            log::debug!("Connection between {} and {} already exists", start_id, end_id);
            return None;
        }
        let connection = Connection::new(start_id, end_id, self.link_style());
        let id = connection.id.clone();
        self.document.push_undo();
        self.document.connections.push(connection);
        Some(id)
    }

    /// Add a directed arrow. Only self-loops and unknown ids are rejected.
    pub fn create_arrow(&mut self, start_id: &str, end_id: &str) -> Option<LinkId> {
        if !self.can_link(start_id, end_id) {
            return None;
        }
        let arrow = Arrow::new(start_id, end_id, self.link_style());
        let id = arrow.id.clone();
        self.document.push_undo();
        self.document.arrows.push(arrow);
        Some(id)
    }

    fn can_link(&self, start_id: &str, end_id: &str) -> bool {
        if start_id == end_id {
            return false;
        }
        let known = self.document.contains_element(start_id) && self.document.contains_element(end_id);
        if !known {
            log::debug!("Cannot link {} -> {}: missing element", start_id, end_id);
        }
        known
    }

    pub fn delete_connection(&mut self, id: &str) -> bool {
        if self.document.connection(id).is_none() {
            return false;
        }
        self.document.push_undo();
        self.document.remove_connection(id);
        if self.selection.connection() == Some(id) {
            self.selection = Selection::None;
        }
        true
    }

    pub fn delete_arrow(&mut self, id: &str) -> bool {
        if self.document.arrow(id).is_none() {
            return false;
        }
        self.document.push_undo();
        self.document.remove_arrow(id);
        if self.selection.arrow() == Some(id) {
            self.selection = Selection::None;
        }
        true
    }

    /// Delete whatever is selected. Returns false when nothing was selected.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection.clone() {
            Selection::None => false,
            Selection::Element(id) => self.delete_element(&id),
            Selection::Connection(id) => self.delete_connection(&id),
            Selection::Arrow(id) => self.delete_arrow(&id),
        }
    }

    // --- selection ---

    pub fn select(&mut self, id: &str) -> bool {
        if !self.document.contains_element(id) {
            return false;
        }
        self.selection = Selection::Element(id.to_string());
        true
    }

    pub fn select_connection(&mut self, id: &str) -> bool {
        if self.document.connection(id).is_none() {
            return false;
        }
        self.selection = Selection::Connection(id.to_string());
        true
    }

    pub fn select_arrow(&mut self, id: &str) -> bool {
        if self.document.arrow(id).is_none() {
            return false;
        }
        self.selection = Selection::Arrow(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Return to idle and clear the selection, leaving geometry untouched.
    pub fn reset(&mut self) {
        self.mode = InteractionMode::Idle;
        self.selection = Selection::None;
    }

    /// Clear a selection or gesture that refers to something no longer present.
    fn drop_dangling_state(&mut self) {
        let selection_alive = match &self.selection {
            Selection::None => true,
            Selection::Element(id) => self.document.contains_element(id),
            Selection::Connection(id) => self.document.connection(id).is_some(),
            Selection::Arrow(id) => self.document.arrow(id).is_some(),
        };
        if !selection_alive {
            self.selection = Selection::None;
        }
        if let Some(anchor) = self.mode.anchor() {
            if !self.document.contains_element(anchor) {
                log::debug!("Cancelling {} gesture on removed element {}", self.mode.name(), anchor);
                self.mode = InteractionMode::Idle;
            }
        }
    }

    // --- history ---

    pub fn undo(&mut self) -> bool {
        if !self.document.undo() {
            return false;
        }
        self.after_history_change();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.document.redo() {
            return false;
        }
        self.after_history_change();
        true
    }

    fn after_history_change(&mut self) {
        self.mode = InteractionMode::Idle;
        self.drop_dangling_state();
        self.connection_manager.retain_present(&self.document.elements);
    }

    // --- queries ---

    /// Draw coordinates of any link in this canvas.
    pub fn coordinates_for(&self, link: &impl Link) -> Option<LinkCoordinates> {
        self.connection_manager
            .coordinates_for(&self.document.elements, link)
    }

    pub fn connection_coordinates(&self, id: &str) -> Option<LinkCoordinates> {
        self.coordinates_for(self.document.connection(id)?)
    }

    pub fn arrow_coordinates(&self, id: &str) -> Option<LinkCoordinates> {
        self.coordinates_for(self.document.arrow(id)?)
    }

    /// The two wing tips of an arrow's head, sized by the editor config.
    pub fn arrow_head_points(&self, id: &str) -> Option<[Point; 2]> {
        let coords = self.arrow_coordinates(id)?;
        Some(arrow_head(coords.end, coords.angle, self.config.arrow_head_size))
    }

    /// Track the pointer for in-progress link previews.
    pub fn set_cursor(&mut self, cursor: Option<Point>) {
        self.cursor = cursor;
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// The link being dragged out, from its source border to the cursor.
    pub fn temp_link(&self) -> Option<TempLink> {
        let (source, directed) = match &self.mode {
            InteractionMode::Connecting { source } => (source, false),
            InteractionMode::ArrowCreating { source } => (source, true),
            _ => return None,
        };
        let cursor = self.cursor?;
        let element = self.document.element(source)?;
        Some(TempLink {
            start: self.connection_manager.temp_coordinates_for(element, cursor),
            end: cursor,
            directed,
        })
    }

    /// Topmost element whose visual box contains `point`.
    pub fn element_at(&self, point: Point) -> Option<&Element> {
        let tolerance = self.config.element_hit_tolerance;
        self.document
            .elements
            .iter()
            .rev()
            .find(|e| self.connection_manager.frame_for(e).contains(point, tolerance))
    }

    /// Corner handle of the selected element under `point`.
    pub fn corner_at(&self, point: Point) -> Option<(ElementId, Corner)> {
        let id = self.selection.element()?;
        let element = self.document.element(id)?;
        let frame = self.connection_manager.frame_for(element);
        hit_test_corner(&frame, point, self.config.handle_hit_tolerance)
            .map(|corner| (id.to_string(), corner))
    }

    /// Nearest connection or arrow within the link hit tolerance.
    pub fn link_at(&self, point: Point) -> Option<LinkHit> {
        let tolerance = self.config.link_hit_tolerance;
        let connections = self.document.connections.iter().filter_map(|c| {
            let coords = self.coordinates_for(c)?;
            Some((point_to_segment_dist(point, coords.start, coords.end), LinkHit::Connection(c.id.clone())))
        });
        let arrows = self.document.arrows.iter().filter_map(|a| {
            let coords = self.coordinates_for(a)?;
            Some((point_to_segment_dist(point, coords.start, coords.end), LinkHit::Arrow(a.id.clone())))
        });
        connections
            .chain(arrows)
            .filter(|(distance, _)| *distance <= tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, hit)| hit)
    }
}
