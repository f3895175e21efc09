//! Image payloads and their sources.

use crate::session::{SessionBlob, SessionRef, SessionStore};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Image format of raw image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Errors decoding an inline data URL.
#[derive(Debug, Error)]
pub enum InlineDataError {
    #[error("Not a data URL")]
    NotDataUrl,
    #[error("Data URL is not base64-encoded")]
    NotBase64,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A base64 copy of an image's bytes, embedded in a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Decoded payload size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl InlineData {
    /// Encode raw bytes as a data URL.
    pub fn encode(bytes: &[u8], mime_type: &str, original_name: Option<String>) -> Self {
        Self {
            data_url: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
            mime_type: mime_type.to_string(),
            original_name,
            size: Some(bytes.len() as u64),
        }
    }

    /// Wrap an existing `data:` URL, taking the MIME type from its header.
    pub fn from_data_url(data_url: &str) -> Result<Self, InlineDataError> {
        let (mime_type, _) = split_data_url(data_url)?;
        Ok(Self {
            data_url: data_url.to_string(),
            mime_type: mime_type.to_string(),
            original_name: None,
            size: None,
        })
    }

    /// Decode the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, InlineDataError> {
        let (_, payload) = split_data_url(&self.data_url)?;
        Ok(STANDARD.decode(payload.trim())?)
    }
}

/// Split `data:<mime>;base64,<payload>` into MIME type and payload.
fn split_data_url(data_url: &str) -> Result<(&str, &str), InlineDataError> {
    let rest = data_url.strip_prefix("data:").ok_or(InlineDataError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(InlineDataError::NotDataUrl)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(InlineDataError::NotBase64)?;
    Ok((mime_type, payload))
}

/// Where an image's pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Bytes held in the session arena (uploads, decoded inline data).
    Session(SessionRef),
    /// A stable remote URL, persisted verbatim.
    Remote(String),
    /// Bytes embedded directly as a data URL.
    Inline(InlineData),
}

impl ImageSource {
    /// Whether this source is only valid for the current session.
    pub fn is_session_local(&self) -> bool {
        matches!(self, ImageSource::Session(_))
    }

    /// Whether a persisted URL string points at a session-scoped resource.
    pub fn is_session_local_url(url: &str) -> bool {
        url.starts_with("blob:") || url.starts_with(SessionRef::SCHEME)
    }
}

/// Photographer/author credit for an image (e.g. from image search).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Image payload of an image element or mentor portrait.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub source: ImageSource,
    pub attribution: Option<Attribution>,
}

/// An image handed over by an upload or search collaborator.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    pub source: ImageSource,
    pub attribution: Option<Attribution>,
    /// Intrinsic pixel size, when known.
    pub intrinsic_size: Option<(u32, u32)>,
}

impl ImageDescriptor {
    /// Register uploaded bytes in the session arena and describe them.
    pub fn from_upload(
        sessions: &mut SessionStore,
        bytes: Vec<u8>,
        original_name: Option<String>,
    ) -> Self {
        let format = ImageFormat::from_magic_bytes(&bytes).or_else(|| {
            original_name
                .as_deref()
                .and_then(|name| name.rsplit_once('.'))
                .and_then(|(_, ext)| ImageFormat::from_extension(ext))
        });
        let mime_type = format
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream");
        let intrinsic_size = probe_dimensions(&bytes);
        let source = sessions.register(SessionBlob::new(bytes, mime_type, original_name));
        Self {
            source: ImageSource::Session(source),
            attribution: None,
            intrinsic_size,
        }
    }

    /// Describe a remote image (e.g. an image search hit).
    pub fn from_url(url: impl Into<String>, attribution: Option<Attribution>) -> Self {
        Self {
            source: ImageSource::Remote(url.into()),
            attribution,
            intrinsic_size: None,
        }
    }

    /// Display size fitting within `max_size` square while preserving aspect ratio.
    pub fn fitted_size(&self, max_size: f64) -> Option<Size> {
        let (width, height) = self.intrinsic_size?;
        if width == 0 || height == 0 || max_size <= 0.0 {
            return None;
        }
        let aspect = width as f64 / height as f64;
        if aspect >= 1.0 {
            Some(Size::new(max_size, max_size / aspect))
        } else {
            Some(Size::new(max_size * aspect, max_size))
        }
    }

    pub fn into_payload(self) -> ImagePayload {
        ImagePayload {
            source: self.source,
            attribution: self.attribution,
        }
    }
}

/// Read the pixel dimensions from an encoded image header.
pub(crate) fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("Could not read image dimensions: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::placeholder_png;

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), None);
    }

    #[test]
    fn test_inline_data_decodes_to_original_bytes() {
        let bytes = vec![0u8, 1, 2, 250, 251, 252];
        let inline = InlineData::encode(&bytes, "image/png", Some("a.png".into()));
        assert!(inline.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(inline.size, Some(6));
        assert_eq!(inline.decode().unwrap(), bytes);
    }

    #[test]
    fn test_inline_data_rejects_bad_urls() {
        let not_data = InlineData::from_data_url("https://example.com/a.png");
        assert!(matches!(not_data, Err(InlineDataError::NotDataUrl)));

        let plain = InlineData::from_data_url("data:text/plain,hello");
        assert!(matches!(plain, Err(InlineDataError::NotBase64)));

        let mut broken = InlineData::encode(b"abc", "image/png", None);
        broken.data_url = "data:image/png;base64,!!!".into();
        assert!(matches!(broken.decode(), Err(InlineDataError::Base64(_))));
    }

    #[test]
    fn test_from_data_url_reads_mime() {
        let inline = InlineData::from_data_url("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.decode().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_upload_registers_session_blob() {
        let mut sessions = SessionStore::new();
        let bytes = placeholder_png().to_vec();
        let descriptor = ImageDescriptor::from_upload(&mut sessions, bytes.clone(), Some("dot.png".into()));

        assert_eq!(descriptor.intrinsic_size, Some((1, 1)));
        let ImageSource::Session(reference) = &descriptor.source else {
            panic!("expected a session source");
        };
        let blob = sessions.get(reference).expect("registered");
        assert_eq!(blob.bytes(), bytes.as_slice());
        assert_eq!(blob.mime_type, "image/png");
    }

    #[test]
    fn test_fitted_size_preserves_aspect() {
        let mut descriptor = ImageDescriptor::from_url("https://example.com/wide.jpg", None);
        assert_eq!(descriptor.fitted_size(300.0), None);

        descriptor.intrinsic_size = Some((1000, 500));
        let size = descriptor.fitted_size(300.0).unwrap();
        assert!((size.width - 300.0).abs() < 1e-9);
        assert!((size.height - 150.0).abs() < 1e-9);

        descriptor.intrinsic_size = Some((500, 1000));
        let size = descriptor.fitted_size(300.0).unwrap();
        assert!((size.width - 150.0).abs() < 1e-9);
        assert!((size.height - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_session_local_urls() {
        assert!(ImageSource::is_session_local_url("blob:https://app/1234"));
        assert!(ImageSource::is_session_local_url("session://abc"));
        assert!(!ImageSource::is_session_local_url("https://images.example.com/x.jpg"));
    }
}
