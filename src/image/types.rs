//! Core types for image generation.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Parses a MIME type, accepting `image/jpg` as an alias and ignoring
    /// parameters such as `; charset=binary`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// A validated reference image sent along with a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Resolved format.
    pub format: ImageFormat,
}

impl ReferenceImage {
    /// Creates a reference image.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to generate one image.
///
/// Reference images are sent first, then the context lines, then the
/// prompt, so the model reads the prompt last.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// The instruction text.
    pub prompt: String,
    /// Extra text parts placed between the images and the prompt.
    pub context: Vec<String>,
    /// Reference images, strongest guidance first.
    pub reference_images: Vec<ReferenceImage>,
    /// Seed for deterministic generation.
    pub seed: Option<u64>,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Adds a reference image.
    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_images.push(image);
        self
    }

    /// Adds several reference images, keeping their order.
    pub fn with_reference_images(mut self, images: impl IntoIterator<Item = ReferenceImage>) -> Self {
        self.reference_images.extend(images);
        self
    }

    /// Adds a context line sent before the prompt.
    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        self.context.push(text.into());
        self
    }

    /// Sets the seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns true if this is an image editing request.
    pub fn is_edit(&self) -> bool {
        !self.reference_images.is_empty()
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: GenerationMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
        }
    }

    /// Creates a new generated image, detecting format from magic bytes.
    pub fn from_bytes(data: Vec<u8>, metadata: GenerationMetadata) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| StudioError::Decode("Unknown image format".into()))?;
        Ok(Self::new(data, format, metadata))
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&PNG_MAGIC), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&JPEG_MAGIC), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(&WEBP_MAGIC), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::from_mime_type("image/webp; q=1"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_mime_type("image/gif"), None);
    }

    #[test]
    fn test_request_builder_keeps_order() {
        let first = ReferenceImage::new(PNG_MAGIC.to_vec(), ImageFormat::Png);
        let second = ReferenceImage::new(JPEG_MAGIC.to_vec(), ImageFormat::Jpeg);
        let req = GenerationRequest::new("Blend these")
            .with_reference_images([first.clone(), second])
            .with_context("note");

        assert!(req.is_edit());
        assert_eq!(req.reference_images[0], first);
        assert_eq!(req.context, vec!["note"]);
        assert!(!GenerationRequest::new("only text").is_edit());
    }

    #[test]
    fn test_generated_image_data_url() {
        let image = GeneratedImage::from_bytes(PNG_MAGIC.to_vec(), GenerationMetadata::default())
            .unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert!(image.to_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
