//! Environment-driven configuration.

use crate::auth::AccessPolicy;
#[cfg(feature = "gemini")]
use crate::error::Result;
#[cfg(feature = "gemini")]
use crate::image::providers::{GeminiModel, GeminiProvider};

/// Settings gathered from the environment.
#[derive(Debug, Clone, Default)]
pub struct StudioConfig {
    /// Gemini API key (`GEMINI_API_KEY`, then `GOOGLE_API_KEY`).
    pub api_key: Option<String>,
    /// Image model identifier (`GEMINI_IMAGE_MODEL`).
    pub image_model: Option<String>,
    /// API base URL override (`GEMINI_BASE_URL`).
    pub base_url: Option<String>,
    /// Allow-list (`ALLOWED_EMAILS`).
    pub access: AccessPolicy,
}

impl StudioConfig {
    /// Reads every setting from the environment. Blank values count as
    /// unset.
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY")),
            image_model: non_empty_env("GEMINI_IMAGE_MODEL"),
            base_url: non_empty_env("GEMINI_BASE_URL"),
            access: AccessPolicy::from_env(),
        }
    }

    /// Overrides the image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    /// Builds a Gemini provider from these settings.
    #[cfg(feature = "gemini")]
    pub fn gemini_provider(&self) -> Result<GeminiProvider> {
        let mut builder = GeminiProvider::builder();
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(model) = &self.image_model {
            builder = builder.model(GeminiModel::from_name(model));
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(all(test, feature = "gemini"))]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_explicit_settings() {
        let config = StudioConfig {
            api_key: Some("test-key".into()),
            ..StudioConfig::default()
        }
        .with_image_model("gemini-3-pro-image-preview");

        let provider = config.gemini_provider().unwrap();
        assert_eq!(provider.model(), &GeminiModel::Pro);
    }
}
