//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, GenerationRequest};
use async_trait::async_trait;

/// Trait for remote image generation backends.
///
/// One call produces at most one image. Modes that need several images
/// issue several independent calls.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image from the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<P: ImageProvider + ?Sized> ImageProvider for std::sync::Arc<P> {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}
