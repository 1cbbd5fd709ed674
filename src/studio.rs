//! Studio operations: one entry point per creative mode.
//!
//! Every operation runs the same pipeline: check the session, validate the
//! uploads, build the prompt, then call the provider. Nothing is sent to
//! the provider until all earlier steps succeed.

use crate::auth::{AccessPolicy, Session};
use crate::error::{Result, StudioError};
use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
use crate::metadata::{fetch_reference_image, fetch_url_metadata};
use crate::progress::{CreativeMode, ProgressEstimator};
use crate::prompt::{
    build_icon_prompt, find_preset, flipbook_frame_prompt, freestyle_prompt, prompt_only_prompt,
    require_text, IconStyle, PromptPreset, DUAL_PORTRAIT_NOTE, FLIPBOOK_FRAMES,
};
use crate::validation::{validate_upload, validate_uploads, Upload};
use std::future::Future;

/// Most reference images accepted by freestyle mode.
pub const MAX_FREESTYLE_IMAGES: usize = 5;

/// Most reference images accepted by icon mode.
pub const MAX_ICON_IMAGES: usize = 3;

/// Single-image edit.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Edit instruction, usually a preset prompt.
    pub prompt: String,
    /// Photo to edit.
    pub image: Upload,
    /// Optional second photo for two-person presets.
    pub second_image: Option<Upload>,
}

impl EditRequest {
    /// Creates an edit with a free-text instruction.
    pub fn new(prompt: impl Into<String>, image: Upload) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            second_image: None,
        }
    }

    /// Creates an edit from a catalogue preset.
    pub fn from_preset(preset: &PromptPreset, image: Upload) -> Self {
        Self::new(preset.prompt, image)
    }

    /// Creates an edit from a preset id.
    pub fn from_preset_id(id: &str, image: Upload) -> Result<Self> {
        let preset = find_preset(id)
            .ok_or_else(|| StudioError::InvalidRequest(format!("unknown preset: {id}")))?;
        Ok(Self::from_preset(preset, image))
    }

    /// Adds the second photo.
    pub fn with_second_image(mut self, image: Upload) -> Self {
        self.second_image = Some(image);
        self
    }
}

/// Four-frame story from one reference image.
#[derive(Debug, Clone)]
pub struct FlipbookRequest {
    /// The story idea.
    pub story: String,
    /// Reference image shared by every frame.
    pub image: Upload,
}

/// Free-form edit over one to five images.
#[derive(Debug, Clone)]
pub struct FreestyleRequest {
    /// Edit instructions.
    pub prompt: String,
    /// Reference images, strongest guidance first.
    pub images: Vec<Upload>,
}

/// Contact icon.
#[derive(Debug, Clone, Default)]
pub struct IconRequest {
    /// Contact name.
    pub name: String,
    /// Web page describing the contact.
    pub url: Option<String>,
    /// Visual style.
    pub style: IconStyle,
    /// Extra instructions.
    pub custom_prompt: Option<String>,
    /// Up to three reference images.
    pub images: Vec<Upload>,
}

/// Runs creative-mode operations against an image provider.
pub struct Studio<P> {
    provider: P,
    access: AccessPolicy,
    http: reqwest::Client,
}

impl<P: ImageProvider> Studio<P> {
    /// Creates a studio gated by `access`.
    pub fn new(provider: P, access: AccessPolicy) -> Self {
        Self {
            provider,
            access,
            http: reqwest::Client::new(),
        }
    }

    /// Replaces the HTTP client used for web page lookups.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Returns the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the access policy.
    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// Edits one photo. A second photo adds the Player 1 / Player 2 note.
    pub async fn edit(&self, session: Option<&Session>, request: EditRequest) -> Result<GeneratedImage> {
        self.access.authorize(session)?;
        let prompt = require_text(&request.prompt, "prompt")?;

        let primary = validate_upload(request.image, "image")?;
        let secondary = request
            .second_image
            .map(|upload| validate_upload(upload, "second image"))
            .transpose()?;

        let mut generation = GenerationRequest::new(prompt).with_reference_image(primary);
        if let Some(secondary) = secondary {
            generation = generation
                .with_reference_image(secondary)
                .with_context(DUAL_PORTRAIT_NOTE);
        }

        self.call(CreativeMode::SingleEdit, &generation).await
    }

    /// Generates four story frames from one photo, one call per frame.
    ///
    /// Stops at the first failing frame; the error names that frame.
    pub async fn flipbook(
        &self,
        session: Option<&Session>,
        request: FlipbookRequest,
    ) -> Result<Vec<GeneratedImage>> {
        self.access.authorize(session)?;
        let story = require_text(&request.story, "story")?;
        let reference = validate_upload(request.image, "image")?;

        let mut frames = Vec::with_capacity(FLIPBOOK_FRAMES);
        for frame in 0..FLIPBOOK_FRAMES {
            let generation = GenerationRequest::new(flipbook_frame_prompt(&story, frame))
                .with_reference_image(reference.clone());

            let image = self
                .call(CreativeMode::Flipbook, &generation)
                .await
                .map_err(|e| name_frame(e, frame + 1))?;
            tracing::debug!(frame = frame + 1, size = image.size(), "flipbook frame generated");
            frames.push(image);
        }
        Ok(frames)
    }

    /// Blends one to five photos following free-form instructions.
    pub async fn freestyle(
        &self,
        session: Option<&Session>,
        request: FreestyleRequest,
    ) -> Result<GeneratedImage> {
        self.access.authorize(session)?;
        let instructions = require_text(&request.prompt, "prompt")?;
        let images = validate_uploads(request.images, 1, MAX_FREESTYLE_IMAGES)?;

        let generation =
            GenerationRequest::new(freestyle_prompt(&instructions)).with_reference_images(images);
        self.call(CreativeMode::Freestyle, &generation).await
    }

    /// Generates an image from text alone.
    pub async fn prompt_only(&self, session: Option<&Session>, prompt: &str) -> Result<GeneratedImage> {
        self.access.authorize(session)?;
        let prompt = require_text(prompt, "prompt")?;

        let generation = GenerationRequest::new(prompt_only_prompt(&prompt));
        self.call(CreativeMode::PromptOnly, &generation).await
    }

    /// Generates a contact icon.
    ///
    /// When a URL is given, the page's title and description feed the
    /// prompt and its preview image is appended after the uploads. Page
    /// lookups never fail the request.
    pub async fn icon(&self, session: Option<&Session>, request: IconRequest) -> Result<GeneratedImage> {
        self.access.authorize(session)?;
        let name = require_text(&request.name, "contact name")?;
        let mut images = validate_uploads(request.images, 0, MAX_ICON_IMAGES)?;

        let url = request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let page = match url {
            Some(url) => fetch_url_metadata(&self.http, url).await,
            None => None,
        };

        let prompt = build_icon_prompt(
            &name,
            request.style,
            page.as_ref(),
            request.custom_prompt.as_deref(),
        );

        if let Some(og_image) = page.as_ref().and_then(|p| p.og_image.as_deref()) {
            match fetch_reference_image(&self.http, og_image).await {
                Some(image) => images.push(image),
                None => tracing::debug!(url = og_image, "preview image skipped"),
            }
        }

        let generation = GenerationRequest::new(prompt).with_reference_images(images);
        self.call(CreativeMode::Icon, &generation).await
    }

    /// Runs `work` while `estimator` plays the mode's phase sequence.
    ///
    /// Completion is signalled whether `work` succeeds or fails; the
    /// result is returned once the estimator reaches a terminal state.
    pub async fn run_tracked<F, T>(
        &self,
        estimator: &ProgressEstimator,
        mode: CreativeMode,
        work: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        estimator.track(mode.phases(), work).await
    }

    async fn call(&self, mode: CreativeMode, request: &GenerationRequest) -> Result<GeneratedImage> {
        tracing::info!(
            mode = %mode,
            provider = self.provider.name(),
            images = request.reference_images.len(),
            "requesting image"
        );
        let result = self.provider.generate(request).await;
        if let Err(e) = &result {
            tracing::warn!(mode = %mode, error = %e, "generation failed");
        }
        result
    }
}

fn name_frame(error: StudioError, frame: usize) -> StudioError {
    let label = format!("frame {frame} of {FLIPBOOK_FRAMES}");
    match error {
        StudioError::NoImageReturned(msg) => StudioError::NoImageReturned(format!("{label}: {msg}")),
        StudioError::ContentBlocked(msg) => StudioError::ContentBlocked(format!("{label}: {msg}")),
        StudioError::UnexpectedResponse(msg) => {
            StudioError::UnexpectedResponse(format!("{label}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{GenerationMetadata, ImageFormat};
    use crate::progress::RunState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<GenerationRequest>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingProvider {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageProvider for RecordingProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            if self.fail_on_call == Some(requests.len()) {
                return Err(StudioError::NoImageReturned("empty candidate".into()));
            }
            Ok(GeneratedImage::new(
                PNG.to_vec(),
                ImageFormat::Png,
                GenerationMetadata::default(),
            ))
        }

        fn name(&self) -> &str {
            "recording"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn studio(provider: RecordingProvider) -> Studio<Arc<RecordingProvider>> {
        Studio::new(Arc::new(provider), AccessPolicy::new(["mom@example.com"]))
    }

    fn mom() -> Session {
        Session::verified("mom@example.com")
    }

    fn png() -> Upload {
        Upload::new(PNG.to_vec()).with_file_name("photo.png")
    }

    #[tokio::test]
    async fn test_gate_runs_before_provider() {
        let studio = studio(RecordingProvider::default());

        let err = studio.prompt_only(None, "a red fox").await.unwrap_err();
        assert_eq!(err.status_code(), 401);

        let stranger = Session::verified("stranger@example.com");
        let err = studio
            .edit(Some(&stranger), EditRequest::new("make it snow", png()))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Unauthorized(_)));
        assert!(studio.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_edit_with_second_image_adds_note() {
        let studio = studio(RecordingProvider::default());
        let request = EditRequest::from_preset_id("martial-arcade", png())
            .unwrap()
            .with_second_image(png());

        let image = studio.edit(Some(&mom()), request).await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);

        let sent = &studio.provider().requests()[0];
        assert_eq!(sent.reference_images.len(), 2);
        assert_eq!(sent.context, vec![DUAL_PORTRAIT_NOTE.to_string()]);
    }

    #[tokio::test]
    async fn test_edit_validation_names_slot() {
        let studio = studio(RecordingProvider::default());
        let request = EditRequest::new("make it snow", png()).with_second_image(Upload::new(Vec::new()));

        let err = studio.edit(Some(&mom()), request).await.unwrap_err();
        assert_eq!(err.to_string(), "second image is empty");

        let err = studio
            .edit(Some(&mom()), EditRequest::new("   ", png()))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
        assert!(studio.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_flipbook_makes_one_call_per_frame() {
        let studio = studio(RecordingProvider::default());
        let request = FlipbookRequest {
            story: " a kite flies away ".into(),
            image: png(),
        };

        let frames = studio.flipbook(Some(&mom()), request).await.unwrap();
        assert_eq!(frames.len(), FLIPBOOK_FRAMES);

        let sent = studio.provider().requests();
        assert_eq!(sent.len(), FLIPBOOK_FRAMES);
        for (index, request) in sent.iter().enumerate() {
            assert_eq!(request.reference_images.len(), 1);
            assert!(request
                .prompt
                .contains(&format!("This is frame {} of 4.", index + 1)));
            assert!(request.prompt.ends_with("a kite flies away"));
        }
    }

    #[tokio::test]
    async fn test_flipbook_error_names_frame() {
        let studio = studio(RecordingProvider::failing_on(3));
        let request = FlipbookRequest {
            story: "a kite".into(),
            image: png(),
        };

        let err = studio.flipbook(Some(&mom()), request).await.unwrap_err();
        assert!(err.to_string().contains("frame 3 of 4"));
        assert_eq!(studio.provider().requests().len(), 3);
    }

    #[tokio::test]
    async fn test_freestyle_image_limits() {
        let studio = studio(RecordingProvider::default());

        let none = FreestyleRequest {
            prompt: "blend".into(),
            images: Vec::new(),
        };
        assert!(studio.freestyle(Some(&mom()), none).await.is_err());

        let six = FreestyleRequest {
            prompt: "blend".into(),
            images: (0..6).map(|_| png()).collect(),
        };
        let err = studio.freestyle(Some(&mom()), six).await.unwrap_err();
        assert!(matches!(err, StudioError::TooManyImages { count: 6, max: 5 }));

        let five = FreestyleRequest {
            prompt: "blend".into(),
            images: (0..5).map(|_| png()).collect(),
        };
        let image = studio.freestyle(Some(&mom()), five).await.unwrap();
        assert_eq!(image.size(), PNG.len());
        let sent = studio.provider().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reference_images.len(), 5);
        assert!(sent[0].prompt.ends_with("User instructions:\nblend"));
    }

    #[tokio::test]
    async fn test_prompt_only_sends_no_images() {
        let studio = studio(RecordingProvider::default());
        let image = studio.prompt_only(Some(&mom()), "  a red fox  ").await.unwrap();
        assert_eq!(image.data, PNG.to_vec());

        let sent = &studio.provider().requests()[0];
        assert!(!sent.is_edit());
        assert!(sent.prompt.ends_with("User prompt:\na red fox"));
    }

    #[tokio::test]
    async fn test_icon_without_url() {
        let studio = studio(RecordingProvider::default());
        let request = IconRequest {
            name: "Grandma".into(),
            url: Some("   ".into()),
            style: IconStyle::PhotoCircle,
            images: vec![png()],
            ..IconRequest::default()
        };

        let image = studio.icon(Some(&mom()), request).await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        let sent = &studio.provider().requests()[0];
        assert_eq!(sent.reference_images.len(), 1);
        assert!(sent.prompt.contains("Contact name: \"Grandma\""));
        assert!(!sent.prompt.contains("Website"));

        let too_many = IconRequest {
            name: "Grandma".into(),
            images: (0..4).map(|_| png()).collect(),
            ..IconRequest::default()
        };
        let err = studio.icon(Some(&mom()), too_many).await.unwrap_err();
        assert!(matches!(err, StudioError::TooManyImages { count: 4, max: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_tracked_completes_after_failure() {
        let studio = studio(RecordingProvider::failing_on(1));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let estimator = ProgressEstimator::builder()
            .tick_interval(Duration::from_millis(50))
            .on_complete(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let result = studio
            .run_tracked(
                &estimator,
                CreativeMode::PromptOnly,
                studio.prompt_only(Some(&mom()), "a red fox"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(estimator.snapshot().state, RunState::Completed);
        assert_eq!(estimator.snapshot().percent, 100.0);
    }
}
