//! Prompt construction for each creative mode.
//!
//! Mode-specific instruction text lives here so that the studio operations
//! only deal with validation and provider calls.

mod icon;
mod presets;
mod templates;

pub use icon::{build_icon_prompt, IconStyle};
pub use presets::{
    find_preset, presets, presets_in, search_presets, PresetCategory, PromptPreset,
    DUAL_PORTRAIT_NOTE, DUAL_PORTRAIT_PRESET_ID,
};
pub use templates::{
    flipbook_frame_prompt, freestyle_prompt, prompt_only_prompt, require_text, FLIPBOOK_FRAMES,
};
