//! Contact-icon prompt construction.

use crate::metadata::UrlMetadata;
use serde::{Deserialize, Serialize};

/// Visual style for a generated contact icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconStyle {
    /// Solid fills and a single symbol.
    FlatMinimal,
    /// Vivid gradient background.
    GradientModern,
    /// Warm hand-drawn look.
    Illustrated,
    /// Retouched circular photo.
    PhotoCircle,
    /// Let the model choose from the contact's nature.
    #[default]
    Auto,
}

impl IconStyle {
    /// All styles, in picker order.
    pub const ALL: [IconStyle; 5] = [
        Self::FlatMinimal,
        Self::GradientModern,
        Self::Illustrated,
        Self::PhotoCircle,
        Self::Auto,
    ];

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FlatMinimal => "flat-minimal",
            Self::GradientModern => "gradient-modern",
            Self::Illustrated => "illustrated",
            Self::PhotoCircle => "photo-circle",
            Self::Auto => "auto",
        }
    }

    /// Parses an identifier; anything unknown means [`IconStyle::Auto`].
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id.trim())
            .unwrap_or_default()
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlatMinimal => "Flat minimal",
            Self::GradientModern => "Modern gradient",
            Self::Illustrated => "Illustrated",
            Self::PhotoCircle => "Photo retouch",
            Self::Auto => "Automatic",
        }
    }

    /// One-line description for pickers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FlatMinimal => "Simple color fields and an icon symbol",
            Self::GradientModern => "Vivid gradient background",
            Self::Illustrated => "Warm, hand-drawn illustration",
            Self::PhotoCircle => "Round icon based on a photo",
            Self::Auto => "Pick the best style from the contact details",
        }
    }

    /// Style instruction embedded in the prompt.
    pub fn prompt_fragment(&self) -> &'static str {
        match self {
            Self::FlatMinimal => "Use a flat, minimal design style with solid color fills, clean geometric shapes, and a single representative symbol or monogram. No gradients, no shadows, no textures. The palette should be limited to 2-3 harmonious colors.",
            Self::GradientModern => "Use a modern gradient design style with vibrant, smooth color transitions as the background. Overlay a clean white or light-colored symbol or monogram. The gradient should feel contemporary and eye-catching, similar to popular app icons.",
            Self::Illustrated => "Use a warm, hand-drawn illustration style with soft outlines, gentle colors, and a friendly, approachable feel. Include small illustrative details that represent the subject. The style should feel personal and inviting.",
            Self::PhotoCircle => "Create a polished, circular profile-style icon. If reference images are provided, use them as the base and apply professional-grade retouching with soft studio lighting and a clean, subtle background. The result should look like a premium contact photo.",
            Self::Auto => "Automatically choose the most appropriate visual style based on the contact's nature. For businesses and organizations, prefer clean and professional designs. For schools and community groups, prefer warm and friendly illustrations. For individuals, prefer polished portrait-style icons.",
        }
    }
}

impl std::fmt::Display for IconStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Builds the icon prompt.
///
/// Website title and description are included when the page metadata has
/// them; blank custom instructions are ignored.
pub fn build_icon_prompt(
    name: &str,
    style: IconStyle,
    page: Option<&UrlMetadata>,
    custom: Option<&str>,
) -> String {
    let mut lines: Vec<String> = vec![
        "You are a professional icon designer for a family photo studio.".into(),
        "Generate a single, high-quality square icon image (512x512 pixels) suitable for use as a contact icon in phone contact lists, LINE, and messaging apps.".into(),
        "The icon must be visually clear at small sizes (40x40 pixels) and work well in circular crop.".into(),
        String::new(),
        format!("Contact name: \"{name}\""),
    ];

    if let Some(page) = page {
        if let Some(title) = &page.title {
            lines.push(format!("Website title: \"{title}\""));
        }
        if let Some(description) = &page.description {
            lines.push(format!("Website description: \"{description}\""));
        }
    }

    lines.push(String::new());
    lines.push(format!("Style: {}", style.prompt_fragment()));

    if let Some(custom) = custom.map(str::trim).filter(|c| !c.is_empty()) {
        lines.push(String::new());
        lines.push(format!("Additional instructions from user: {custom}"));
    }

    lines.push(String::new());
    lines.push("IMPORTANT: Output exactly one square image. Do not include any text labels, watermarks, or borders. Focus the composition so the main element fills the frame well for circular cropping.".into());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_style_is_auto() {
        assert_eq!(IconStyle::from_id("gradient-modern"), IconStyle::GradientModern);
        assert_eq!(IconStyle::from_id("neon"), IconStyle::Auto);
        assert_eq!(IconStyle::from_id(""), IconStyle::Auto);
    }

    #[test]
    fn test_prompt_without_page() {
        let prompt = build_icon_prompt("Sakura School", IconStyle::Illustrated, None, Some("  "));
        assert!(prompt.contains("Contact name: \"Sakura School\""));
        assert!(prompt.contains("Style: Use a warm, hand-drawn"));
        assert!(!prompt.contains("Website"));
        assert!(!prompt.contains("Additional instructions"));
        assert!(prompt.ends_with("circular cropping."));
    }

    #[test]
    fn test_prompt_with_page_and_custom() {
        let page = UrlMetadata {
            title: Some("Bakery Hana".into()),
            description: None,
            og_image: Some("https://example.com/og.png".into()),
        };
        let prompt = build_icon_prompt("Hana", IconStyle::Auto, Some(&page), Some(" use pink "));
        assert!(prompt.contains("Website title: \"Bakery Hana\""));
        assert!(!prompt.contains("Website description"));
        assert!(prompt.contains("\n\nAdditional instructions from user: use pink\n\n"));
    }
}
