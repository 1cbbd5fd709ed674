//! Upload validation.
//!
//! Every image entering a generation request passes through here: it must
//! be non-empty, at most [`MAX_UPLOAD_BYTES`], and resolve to JPEG, PNG or
//! WebP.

use crate::error::{Result, StudioError};
use crate::image::{ImageFormat, ReferenceImage};
use std::path::Path;

/// Largest accepted upload, in bytes (8 MiB).
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// An uploaded file as received from a form or read from disk.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Original file name, if known.
    pub file_name: Option<String>,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl Upload {
    /// Creates an upload from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Sets the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Sets the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads an upload from disk, keeping the file name for type resolution.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut upload = Self::new(data);
        upload.file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(upload)
    }

    /// Returns the size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Resolves the image type of an upload.
///
/// The declared content type wins when it is one of the accepted types
/// (`image/jpg` counts as JPEG). Otherwise the file extension decides, and
/// as a last resort the leading magic bytes.
pub fn resolve_mime_type(
    content_type: Option<&str>,
    file_name: Option<&str>,
    data: &[u8],
) -> Option<ImageFormat> {
    content_type
        .filter(|t| !t.trim().is_empty())
        .and_then(ImageFormat::from_mime_type)
        .or_else(|| {
            file_name
                .and_then(|name| Path::new(name).extension())
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .or_else(|| ImageFormat::from_magic_bytes(data))
}

/// Validates one upload and turns it into a reference image.
///
/// `slot` names the upload in error messages (e.g. `"image 2"`).
pub fn validate_upload(upload: Upload, slot: &str) -> Result<ReferenceImage> {
    if upload.data.is_empty() {
        return Err(StudioError::EmptyUpload { slot: slot.into() });
    }

    if upload.size() > MAX_UPLOAD_BYTES {
        return Err(StudioError::UploadTooLarge {
            slot: slot.into(),
            size: upload.size(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let format = resolve_mime_type(
        upload.content_type.as_deref(),
        upload.file_name.as_deref(),
        &upload.data,
    )
    .ok_or_else(|| StudioError::UnsupportedImageType { slot: slot.into() })?;

    tracing::trace!(slot, size = upload.size(), format = %format, "upload accepted");
    Ok(ReferenceImage::new(upload.data, format))
}

/// Validates a batch of uploads, naming them "image 1", "image 2", ...
///
/// Fails if fewer than `min` or more than `max` uploads are supplied.
pub fn validate_uploads(uploads: Vec<Upload>, min: usize, max: usize) -> Result<Vec<ReferenceImage>> {
    if uploads.len() < min {
        return Err(StudioError::InvalidRequest(format!(
            "upload at least {min} image(s)"
        )));
    }
    if uploads.len() > max {
        return Err(StudioError::TooManyImages {
            count: uploads.len(),
            max,
        });
    }

    uploads
        .into_iter()
        .enumerate()
        .map(|(index, upload)| validate_upload(upload, &format!("image {}", index + 1)))
        .collect()
}
