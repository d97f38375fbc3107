//! Decode collaborator: raw bytes (from a file or a `data:` URL) to
//! [`DecodedImage`].

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, warn};

use crate::decoded::{DecodedImage, ImageError};

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data URL: {0}")]
    DataUrl(String),

    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("corrupt image data")]
    Corrupt(#[source] image::ImageError),

    #[error(transparent)]
    Empty(#[from] ImageError),
}

/// Raw image bytes plus whatever format the source declared.
#[derive(Clone, Debug)]
pub struct RawImage {
    /// Human-readable origin, used in notices.
    pub label: String,
    pub bytes: Vec<u8>,
    /// `None` means "sniff from content".
    pub format: Option<Declared>,
}

/// A format declared by extension or MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declared {
    Raster(ImageFormat),
    /// Recognised as an image but not rasterisable here.
    Svg,
}

impl Declared {
    fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "svg" {
            return Some(Self::Svg);
        }
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        ImageFormat::from_extension(&ext).map(Self::Raster)
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.to_ascii_lowercase();
        match mime.as_str() {
            "image/svg+xml" => Some(Self::Svg),
            "image/x-icon" | "image/vnd.microsoft.icon" => Some(Self::Raster(ImageFormat::Ico)),
            _ => ImageFormat::from_mime_type(&mime).map(Self::Raster),
        }
    }
}

impl RawImage {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>, format: Option<Declared>) -> Self {
        Self {
            label: label.into(),
            bytes,
            format,
        }
    }

    /// Read a source string: either a `data:<mime>;base64,<payload>` URL or
    /// a filesystem path.
    pub fn from_source(source: &str) -> Result<Self, DecodeError> {
        if let Some(rest) = source.strip_prefix("data:") {
            return Self::from_data_url(rest);
        }
        Self::from_path(Path::new(source))
    }

    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Declared::from_extension);
        Ok(Self::new(path.display().to_string(), bytes, format))
    }

    /// Parse everything after the `data:` scheme.
    fn from_data_url(rest: &str) -> Result<Self, DecodeError> {
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::DataUrl("missing ',' separator".into()))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| DecodeError::DataUrl("only base64 payloads are supported".into()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DecodeError::DataUrl(e.to_string()))?;
        let label = if mime.is_empty() {
            "data URL".to_string()
        } else {
            format!("data URL ({mime})")
        };
        Ok(Self::new(label, bytes, Declared::from_mime(mime)))
    }
}

/// Decode raw bytes into an RGBA8 image.
pub fn decode(raw: &RawImage) -> Result<DecodedImage, DecodeError> {
    let dynamic = match raw.format {
        Some(Declared::Svg) => return Err(DecodeError::Unsupported("svg".into())),
        Some(Declared::Raster(format)) => image::load_from_memory_with_format(&raw.bytes, format),
        None => image::load_from_memory(&raw.bytes),
    }
    .map_err(|e| match e {
        image::ImageError::Unsupported(u) => DecodeError::Unsupported(u.to_string()),
        other => DecodeError::Corrupt(other),
    })?;
    let img = DecodedImage::from_rgba(dynamic.to_rgba8())?;
    debug!(source = %raw.label, width = img.width(), height = img.height(), "decoded");
    Ok(img)
}

/// Decode one side of a comparison, degrading any failure to absence.
pub fn decode_side(raw: Option<&RawImage>) -> Option<DecodedImage> {
    let raw = raw?;
    match decode(raw) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(source = %raw.label, error = %e, "could not decode image, treating as absent");
            None
        }
    }
}
