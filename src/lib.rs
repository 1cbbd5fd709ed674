#![warn(missing_docs)]
//! nb-studio - Gemini image studio with simulated progress.
//!
//! This crate provides the building blocks of a small family photo studio:
//! creative modes that turn photos and text into Gemini image requests, and
//! a phase-based progress estimator that keeps a progress bar moving while
//! a remote call runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use nb_studio::{AccessPolicy, GeminiProvider, Session, Studio};
//!
//! #[tokio::main]
//! async fn main() -> nb_studio::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let studio = Studio::new(provider, AccessPolicy::from_env());
//!     let session = Session::verified("me@example.com");
//!     let image = studio.prompt_only(Some(&session), "A golden retriever puppy").await?;
//!     image.save("puppy.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Progress
//!
//! ```no_run
//! use nb_studio::progress::{CreativeMode, ProgressEstimator};
//!
//! # async fn run() {
//! let estimator = ProgressEstimator::new(|| println!("done"));
//! let mut updates = estimator.subscribe();
//! estimator.start(CreativeMode::Flipbook.phases());
//! while updates.changed().await.is_ok() {
//!     let snapshot = *updates.borrow();
//!     println!("{}%", snapshot.rounded_percent());
//!     # break;
//! }
//! estimator.signal_real_completion();
//! # }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): Gemini image provider
//! - `cli`: Command-line interface

mod error;

pub mod auth;
pub mod config;
pub mod image;
pub mod metadata;
pub mod progress;
pub mod prompt;
pub mod studio;
pub mod validation;

// Re-export error types at crate root
pub use error::{Result, StudioError};

pub use auth::{AccessPolicy, Session};
pub use config::StudioConfig;
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
    ReferenceImage,
};
pub use progress::{CreativeMode, Phase, PhaseSequence, ProgressEstimator, ProgressSnapshot};
pub use studio::{EditRequest, FlipbookRequest, FreestyleRequest, IconRequest, Studio};
pub use validation::Upload;

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
    pub use crate::progress::{CreativeMode, ProgressEstimator};
    pub use crate::studio::Studio;
    pub use crate::validation::Upload;
    pub use crate::{AccessPolicy, Session};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiProvider;
}
