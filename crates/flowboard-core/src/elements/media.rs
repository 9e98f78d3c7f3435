//! Media references for image and video elements.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Encoding of inline media data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaFormat {
    Png,
    Jpeg,
    WebP,
    Mp4,
    WebM,
}

impl MediaFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::WebM => "video/webm",
        }
    }

    /// Whether this format holds moving pictures.
    pub fn is_video(&self) -> bool {
        matches!(self, MediaFormat::Mp4 | MediaFormat::WebM)
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(MediaFormat::Png),
            "jpg" | "jpeg" => Some(MediaFormat::Jpeg),
            "webp" => Some(MediaFormat::WebP),
            "mp4" | "m4v" => Some(MediaFormat::Mp4),
            "webm" => Some(MediaFormat::WebM),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(MediaFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(MediaFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(MediaFormat::WebP);
        }

        // EBML header
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(MediaFormat::WebM);
        }

        // ISO base media: ....ftyp
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(MediaFormat::Mp4);
        }

        None
    }
}

/// Where the pixels of an image or video element come from.
///
/// The core never decodes media; it only carries the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    /// Remote or application-resolved location.
    Url { url: String },
    /// Bytes embedded in the scene as base64.
    Inline {
        format: MediaFormat,
        data_base64: String,
    },
}

impl MediaSource {
    /// Reference media by URL.
    pub fn url(url: impl Into<String>) -> Self {
        MediaSource::Url { url: url.into() }
    }

    /// Embed raw bytes, detecting the format from their header.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        MediaFormat::from_magic_bytes(data).map(|format| Self::inline(format, data))
    }

    /// Embed raw bytes of a known format.
    pub fn inline(format: MediaFormat, data: &[u8]) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};

        MediaSource::Inline {
            format,
            data_base64: STANDARD.encode(data),
        }
    }

    /// Decode the inline bytes, if any.
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        match self {
            MediaSource::Inline { data_base64, .. } => STANDARD.decode(data_base64).ok(),
            MediaSource::Url { .. } => None,
        }
    }

    /// Whether the referenced media is known to be a video.
    pub fn is_video(&self) -> bool {
        match self {
            MediaSource::Inline { format, .. } => format.is_video(),
            MediaSource::Url { url } => url
                .rsplit('.')
                .next()
                .and_then(MediaFormat::from_extension)
                .is_some_and(|f| f.is_video()),
        }
    }
}

/// Scale `size` to fit within `max` while preserving aspect ratio.
///
/// Sizes already inside the box are returned unchanged.
pub fn fit_within(size: Size, max: Size) -> Size {
    if size.width <= max.width && size.height <= max.height {
        return size;
    }
    let aspect = size.width / size.height;
    let target_aspect = max.width / max.height;

    if aspect > target_aspect {
        // Wider than the box: fit to width
        Size::new(max.width, max.width / aspect)
    } else {
        Size::new(max.height * aspect, max.height)
    }
}
