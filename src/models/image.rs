use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,

    #[error("invalid MIME type {0:?}")]
    InvalidMime(String),

    #[error("not a base64 data URL")]
    NotDataUrl,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A locally selected image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        ImageBlob {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Encodes the blob as `data:<mime>;base64,<payload>` so it can be stored
    /// inline in the listing document.
    pub fn to_data_url(&self) -> Result<String, ImageError> {
        if self.bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        check_mime(&self.mime)?;
        Ok(format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes)))
    }

    pub fn from_data_url(url: &str) -> Result<Self, ImageError> {
        let rest = url.strip_prefix("data:").ok_or(ImageError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUrl)?;
        let mime = header.strip_suffix(";base64").ok_or(ImageError::NotDataUrl)?;
        check_mime(mime)?;

        let bytes = STANDARD.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(ImageBlob::new(bytes, mime))
    }
}

// type "/" subtype, both restricted to RFC 6838 name characters
fn check_mime(mime: &str) -> Result<(), ImageError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    match mime.split_once('/') {
        Some((kind, sub)) if valid_part(kind) && valid_part(sub) => Ok(()),
        _ => Err(ImageError::InvalidMime(mime.to_string())),
    }
}
