//! Vision Board Core
//!
//! Platform-agnostic editing core for the vision board canvas: element
//! geometry, the element and link store, the pointer/keyboard interaction
//! state machine, and board persistence.

pub mod canvas;
pub mod canvas_io;
pub mod config;
pub mod connection_manager;
pub mod elements;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod links;
pub mod selection;
pub mod session;
pub mod storage;

pub use canvas::{Canvas, CanvasDocument, CanvasSet, LinkHit, TempLink};
pub use canvas_io::{BoardDocument, CanvasIoError, Deserialized, ExportError, LoadOutcome, RasterRenderer};
pub use config::EditorConfig;
pub use connection_manager::{ConnectionManager, LinkCoordinates};
pub use elements::{
    Element, ElementId, ElementKind, ElementPatch, ElementTemplate, ElementType, ImageSource,
    MAX_SCALE, MIN_SCALE,
};
pub use geometry::ElementFrame;
pub use input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::InteractionController;
pub use links::{Arrow, Connection, Link, LinkId, LinkStyle};
pub use selection::{Corner, InteractionMode, Selection};
pub use session::{SessionRef, SessionStore};
pub use storage::{AutoSaveManager, MemoryStorage, Storage, StorageError};
