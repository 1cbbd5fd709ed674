//! Phase sequences for each creative mode.

use super::phase::PhaseSequence;
use serde::{Deserialize, Serialize};

const SINGLE_EDIT: &[(&str, &str, u64)] = &[
    ("upload", "Uploading image...", 1500),
    ("analyze", "Analyzing image...", 1800),
    ("prompt", "Processing prompt...", 1200),
    ("generate", "Generating with Gemini...", 6500),
    ("optimize", "Optimizing result...", 1200),
    ("complete", "Done", 400),
];

const FLIPBOOK: &[(&str, &str, u64)] = &[
    ("plan", "Planning the story...", 1500),
    ("frame1", "Generating frame 1/4...", 3600),
    ("frame2", "Generating frame 2/4...", 3200),
    ("frame3", "Generating frame 3/4...", 3200),
    ("frame4", "Generating frame 4/4...", 3200),
    ("compile", "Putting the frames together...", 1200),
    ("complete", "Done", 400),
];

const FREESTYLE: &[(&str, &str, u64)] = &[
    ("gather", "Loading reference images...", 1600),
    ("plan", "Planning the edit...", 1800),
    ("prompt", "Interpreting instructions...", 1500),
    ("generate", "Generating with Gemini...", 6200),
    ("refine", "Refining the result...", 1400),
    ("complete", "Done", 400),
];

const PROMPT_ONLY: &[(&str, &str, u64)] = &[
    ("plan", "Imagining the scene...", 1400),
    ("prompt", "Reading the prompt...", 1600),
    ("generate", "Generating with Gemini...", 6400),
    ("refine", "Refining the result...", 1200),
    ("complete", "Done", 400),
];

const ICON: &[(&str, &str, u64)] = &[
    ("analyze", "Analyzing contact details...", 1200),
    ("fetch-url", "Fetching details from URL...", 1800),
    ("build-prompt", "Building the design plan...", 1200),
    ("generate", "Generating icon with Gemini...", 6000),
    ("polish", "Polishing...", 1000),
    ("complete", "Done", 400),
];

/// The studio's creative modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreativeMode {
    /// One image edited with a curated preset.
    SingleEdit,
    /// Four-frame story generated from one reference image.
    Flipbook,
    /// Free-form instruction over up to five images.
    Freestyle,
    /// Generation from a prompt alone.
    PromptOnly,
    /// Contact icon, optionally informed by a web page.
    Icon,
}

impl CreativeMode {
    /// All modes, in menu order.
    pub const ALL: [CreativeMode; 5] = [
        Self::SingleEdit,
        Self::Flipbook,
        Self::Freestyle,
        Self::PromptOnly,
        Self::Icon,
    ];

    /// Returns the mode identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleEdit => "single-edit",
            Self::Flipbook => "flipbook",
            Self::Freestyle => "freestyle",
            Self::PromptOnly => "prompt-only",
            Self::Icon => "icon",
        }
    }

    /// Returns the progress phases tuned to this mode's latency profile.
    pub fn phases(&self) -> PhaseSequence {
        let table = match self {
            Self::SingleEdit => SINGLE_EDIT,
            Self::Flipbook => FLIPBOOK,
            Self::Freestyle => FREESTYLE,
            Self::PromptOnly => PROMPT_ONLY,
            Self::Icon => ICON,
        };
        PhaseSequence::from_table(table)
    }
}

impl std::fmt::Display for CreativeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
