//! Session-scoped binary references.
//!
//! Uploaded files and decoded inline images live in a [`SessionStore`] arena for
//! the lifetime of an editing session. Elements only hold an opaque
//! [`SessionRef`]; the canvas serializer is the one place that turns a reference
//! into durable inline bytes and back.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Opaque handle to bytes held in a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionRef(String);

impl SessionRef {
    /// URL scheme used for session references.
    pub const SCHEME: &'static str = "session://";

    fn fresh() -> Self {
        Self(format!("{}{}", Self::SCHEME, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes plus the metadata needed to re-embed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBlob {
    bytes: Arc<[u8]>,
    pub mime_type: String,
    pub original_name: Option<String>,
}

impl SessionBlob {
    pub fn new(bytes: Vec<u8>, mime_type: &str, original_name: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.to_string(),
            original_name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Arena of session-local binary resources.
#[derive(Debug, Default)]
pub struct SessionStore {
    blobs: HashMap<SessionRef, SessionBlob>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob and hand back a fresh reference to it.
    pub fn register(&mut self, blob: SessionBlob) -> SessionRef {
        let reference = SessionRef::fresh();
        log::debug!("Registered {} ({} bytes)", reference, blob.len());
        self.blobs.insert(reference.clone(), blob);
        reference
    }

    /// Register the 1x1 placeholder image.
    pub fn register_placeholder(&mut self) -> SessionRef {
        self.register(SessionBlob::new(placeholder_png().to_vec(), "image/png", None))
    }

    pub fn get(&self, reference: &SessionRef) -> Option<&SessionBlob> {
        self.blobs.get(reference)
    }

    pub fn contains(&self, reference: &SessionRef) -> bool {
        self.blobs.contains_key(reference)
    }

    /// Release one reference. Returns false if it was already gone.
    pub fn release(&mut self, reference: &SessionRef) -> bool {
        self.blobs.remove(reference).is_some()
    }

    /// Release every reference in `references`, returning how many were live.
    pub fn dispose<'a>(&mut self, references: impl IntoIterator<Item = &'a SessionRef>) -> usize {
        let released = references
            .into_iter()
            .filter(|reference| self.release(reference))
            .count();
        log::debug!("Disposed {} session references", released);
        released
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// A deterministic 1x1 transparent PNG used when an image cannot be resolved.
pub fn placeholder_png() -> &'static [u8] {
    static PLACEHOLDER: OnceLock<Vec<u8>> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| match encode_png(&[0, 0, 0, 0], 1, 1) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Failed to encode placeholder PNG: {}", e);
            Vec::new()
        }
    })
}

pub(crate) fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, png::EncodingError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba_data)?;
        writer.finish()?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_release() {
        let mut store = SessionStore::new();
        let a = store.register(SessionBlob::new(vec![1, 2, 3], "image/png", None));
        let b = store.register(SessionBlob::new(vec![4], "image/jpeg", Some("b.jpg".into())));

        assert_ne!(a, b);
        assert!(a.as_str().starts_with(SessionRef::SCHEME));
        assert_eq!(store.get(&a).unwrap().bytes(), &[1, 2, 3]);
        assert_eq!(store.len(), 2);

        assert!(store.release(&a));
        assert!(!store.release(&a));
        assert!(!store.contains(&a));
        assert!(store.contains(&b));
    }

    #[test]
    fn test_dispose_counts_live_references() {
        let mut store = SessionStore::new();
        let a = store.register(SessionBlob::new(vec![1], "image/png", None));
        let b = store.register(SessionBlob::new(vec![2], "image/png", None));
        store.release(&b);

        assert_eq!(store.dispose([&a, &b]), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_placeholder_is_deterministic_png() {
        let first = placeholder_png();
        let second = placeholder_png();
        assert_eq!(first, second);
        assert!(first.starts_with(&[0x89, 0x50, 0x4E, 0x47]));

        let mut store = SessionStore::new();
        let a = store.register_placeholder();
        let b = store.register_placeholder();
        assert_ne!(a, b);
        assert_eq!(store.get(&a).unwrap().bytes(), store.get(&b).unwrap().bytes());
    }
}
