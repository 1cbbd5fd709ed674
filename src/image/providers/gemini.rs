//! Gemini (Google) image generation provider.

use crate::config::non_empty_env;
use crate::error::{parse_retry_after, sanitize_error_message, Result, StudioError};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini image model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    Flash,
    /// Gemini 3 Pro Image preview (highest quality).
    Pro,
    /// Gemini 3.1 Flash Image preview.
    NextFlash,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
            Self::NextFlash => "gemini-3.1-flash-image-preview",
            Self::Custom(name) => name,
        }
    }

    /// Maps a model identifier onto a known variant.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "gemini-2.5-flash-image" => Self::Flash,
            "gemini-3-pro-image-preview" => Self::Pro,
            "gemini-3.1-flash-image-preview" => Self::NextFlash,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: Option<GeminiModel>,
    base_url: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model. Falls back to `GEMINI_IMAGE_MODEL`, then
    /// [`GeminiModel::Flash`].
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider, resolving the API key and model.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| non_empty_env("GEMINI_API_KEY"))
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
            .ok_or_else(|| {
                StudioError::Auth("GEMINI_API_KEY not set and no API key provided".into())
            })?;

        let model = self
            .model
            .or_else(|| non_empty_env("GEMINI_IMAGE_MODEL").map(|m| GeminiModel::from_name(&m)))
            .unwrap_or_default();

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            images = request.reference_images.len(),
            prompt_chars = request.prompt.chars().count(),
            "sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let (data, format) = gemini_response.into_image()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            duration_ms,
            bytes = data.len(),
            "Gemini image generation complete"
        );

        Ok(GeneratedImage::new(
            data,
            format,
            GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
            },
        ))
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> StudioError {
        let text = sanitize_error_message(text);
        if status == 404 {
            return StudioError::InvalidRequest(format!(
                "Model '{}' not found. Verify the model name is correct.",
                self.model.as_str()
            ));
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return StudioError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return StudioError::Auth(text);
        }
        let lower = text.to_lowercase();
        if lower.contains("safety")
            || lower.contains("blocked")
            || lower.contains("content_policy")
            || lower.contains("prohibited")
        {
            return StudioError::ContentBlocked(text);
        }
        StudioError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("Invalid API key".into())),
            404 => Err(StudioError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        let mut parts: Vec<GeminiRequestPart> = req
            .reference_images
            .iter()
            .map(|image| GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.format.mime_type().to_string(),
                    data: image.to_base64(),
                },
            })
            .collect();

        parts.extend(
            req.context
                .iter()
                .map(|text| GeminiRequestPart::Text { text: text.clone() }),
        );
        parts.push(GeminiRequestPart::Text {
            text: req.prompt.clone(),
        });

        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts,
            }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
                seed: req.seed,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    /// Extracts the first inline image of the first candidate.
    fn into_image(self) -> Result<(Vec<u8>, ImageFormat)> {
        // Blocked prompts come back as HTTP 200
        if let Some(ref feedback) = self.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            StudioError::NoImageReturned("No candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "IMAGE_RECITATION"
                | "RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(StudioError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(StudioError::NoImageReturned(format!(
                        "Generation failed: {}. Try a different prompt.",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let inline_data = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data.filter(|d| !d.data.is_empty()))
            .ok_or_else(|| {
                StudioError::NoImageReturned("No image data in Gemini response".into())
            })?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline_data.data)
            .map_err(|e| StudioError::Decode(e.to_string()))?;

        let format = inline_data
            .mime_type
            .as_deref()
            .and_then(ImageFormat::from_mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();

        Ok((data, format))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::ReferenceImage;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_gemini_model_names() {
        assert_eq!(GeminiModel::Flash.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::Pro.as_str(), "gemini-3-pro-image-preview");
        assert_eq!(
            GeminiModel::from_name("gemini-3.1-flash-image-preview"),
            GeminiModel::NextFlash
        );
        assert_eq!(
            GeminiModel::from_name("gemini-2.5-flash-image-preview").as_str(),
            "gemini-2.5-flash-image-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::Flash);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiProviderBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::Pro)
            .base_url("http://localhost:9000/v1beta/")
            .build()
            .unwrap();
        assert_eq!(provider.model(), &GeminiModel::Pro);
        assert_eq!(provider.base_url, "http://localhost:9000/v1beta");
    }

    #[test]
    fn test_request_construction_text_only() {
        let req = GenerationRequest::new("A puppy");
        let gemini_req = GeminiRequest::from_generation_request(&req);

        assert_eq!(gemini_req.contents.len(), 1);
        assert_eq!(gemini_req.contents[0].role, "user");
        assert_eq!(gemini_req.contents[0].parts.len(), 1);
        assert_eq!(
            gemini_req.generation_config.response_modalities,
            vec!["IMAGE"]
        );
        assert!(gemini_req.generation_config.seed.is_none());
    }

    #[test]
    fn test_request_orders_images_context_prompt() {
        let req = GenerationRequest::new("Fight!")
            .with_reference_image(ReferenceImage::new(PNG_MAGIC.to_vec(), ImageFormat::Png))
            .with_reference_image(ReferenceImage::new(vec![0xFF, 0xD8, 0xFF], ImageFormat::Jpeg))
            .with_context("First photo is Player 1.");
        let json = serde_json::to_value(GeminiRequest::from_generation_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[2]["text"], "First photo is Player 1.");
        assert_eq!(parts[3]["text"], "Fight!");
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let req = GenerationRequest::new("A puppy").with_seed(1);
        let json = serde_json::to_value(GeminiRequest::from_generation_request(&req)).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        assert_eq!(json["generationConfig"]["seed"], 1);
    }

    #[test]
    fn test_response_yields_first_image() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/webp", "data": "UklGRg=="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let (data, format) = resp.into_image().unwrap();
        assert_eq!(data, b"RIFF");
        assert_eq!(format, ImageFormat::WebP);
    }

    #[test]
    fn test_response_missing_mime_defaults_to_png() {
        let json = r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "AAAA"}}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let (_, format) = resp.into_image().unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_response_no_image_data() {
        let json = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_image().unwrap_err();
        assert!(matches!(err, StudioError::NoImageReturned(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_image().unwrap_err();
        assert_eq!(err.to_string(), "content blocked: Prompt was blocked due to safety");
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_image(),
            Err(StudioError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_parse_error_mapping() {
        let provider = GeminiProvider::builder().api_key("k").build().unwrap();
        let headers = reqwest::header::HeaderMap::new();

        assert!(matches!(
            provider.parse_error(403, "denied", &headers),
            StudioError::Auth(_)
        ));
        assert!(matches!(
            provider.parse_error(429, "slow down", &headers),
            StudioError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            provider.parse_error(400, "request blocked by policy", &headers),
            StudioError::ContentBlocked(_)
        ));
        assert!(matches!(
            provider.parse_error(500, "oops", &headers),
            StudioError::Api { status: 500, .. }
        ));
    }
}
