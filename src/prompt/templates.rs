//! Fixed instruction wrappers around user text.

use crate::error::{Result, StudioError};

/// Number of frames in a flipbook.
pub const FLIPBOOK_FRAMES: usize = 4;

const FRAME_GUIDANCE: [&str; FLIPBOOK_FRAMES] = [
    "Introduce the setting and the characters while keeping the mood of the original image.",
    "Give the characters a little movement and show the story beginning.",
    "Build toward a moment where the action or emotion rises.",
    "Wrap up from the climax into the aftermath, framed so the lingering motion is visible.",
];

/// Trims `text` and rejects it if nothing is left.
///
/// `what` names the field in the error message.
pub fn require_text(text: &str, what: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StudioError::InvalidRequest(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Builds the prompt for one flipbook frame. `frame` is zero-based.
///
/// Frames past the guidance table reuse its last entry.
pub fn flipbook_frame_prompt(story: &str, frame: usize) -> String {
    let guidance = FRAME_GUIDANCE
        .get(frame)
        .or_else(|| FRAME_GUIDANCE.last())
        .copied()
        .unwrap_or_default();

    [
        "You are generating a single frame of a story-driven flipbook animation.".to_string(),
        "Respect the uploaded reference image and keep the main character(s), colors, and atmosphere consistent across all frames.".to_string(),
        "The flipbook must feel like it is expanding upon the reference scene with gentle motion between frames.".to_string(),
        format!("This is frame {} of {FLIPBOOK_FRAMES}. {guidance}", frame + 1),
        "Describe motion by adjusting body pose, facial expression, and environment details slightly so that the next frame flows naturally from this one.".to_string(),
        "Do not add text, UI, or speech bubbles.".to_string(),
        format!("Overall story idea from the user: {story}"),
    ]
    .join("\n")
}

/// Wraps freestyle instructions for a multi-image blend.
pub fn freestyle_prompt(instructions: &str) -> String {
    [
        "You are a helpful creative image editor for a family photo studio.",
        "CRITICAL INSTRUCTION: You MUST preserve the exact facial features, identity, and likeness of the person in the uploaded reference image(s). The generated person MUST look 100% identical to the reference.",
        "Use the uploaded images purely as visual references.",
        "Blend the key elements from each reference in order, keeping the first uploads as the strongest guidance.",
        "Follow the user's instructions precisely and return exactly one polished image.",
        "User instructions:",
        instructions,
    ]
    .join("\n")
}

/// Wraps a text-only prompt.
pub fn prompt_only_prompt(prompt: &str) -> String {
    [
        "You are a helpful creative image generator for a family photo studio.",
        "Produce exactly one high-quality final image based solely on the user's prompt.",
        "Avoid adding any text, logos, or watermarks unless the user explicitly requests them.",
        "User prompt:",
        prompt,
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  a cat \n", "prompt").unwrap(), "a cat");
        let err = require_text(" \t ", "story").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("story"));
    }

    #[test]
    fn test_flipbook_frame_prompt() {
        let first = flipbook_frame_prompt("a dog finds a ball", 0);
        assert!(first.contains("This is frame 1 of 4. Introduce the setting"));
        assert!(first.ends_with("Overall story idea from the user: a dog finds a ball"));

        let last = flipbook_frame_prompt("x", 3);
        assert!(last.contains("This is frame 4 of 4. Wrap up"));
    }

    #[test]
    fn test_flipbook_guidance_reused_past_table() {
        let extra = flipbook_frame_prompt("x", 6);
        assert!(extra.contains("This is frame 7 of 4. Wrap up"));
    }

    #[test]
    fn test_wrappers_end_with_user_text() {
        assert!(freestyle_prompt("swap hats").ends_with("User instructions:\nswap hats"));
        assert!(prompt_only_prompt("a red fox").ends_with("User prompt:\na red fox"));
    }
}
