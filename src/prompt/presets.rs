//! Curated edit presets for single-image mode.

use serde::Serialize;

/// Preset grouping shown as tabs in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCategory {
    /// Stylised and playful transformations.
    Creative,
    /// Profile and ID-style portraits.
    Business,
    /// Larger-than-life scenes.
    Fantasy,
}

impl PresetCategory {
    /// All categories, in tab order.
    pub const ALL: [PresetCategory; 3] = [Self::Creative, Self::Business, Self::Fantasy];

    /// Returns the display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "creative",
            Self::Business => "business",
            Self::Fantasy => "fantasy",
        }
    }
}

impl std::fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, ready-made edit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptPreset {
    /// Stable identifier.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Picker tab.
    pub category: PresetCategory,
    /// Instruction sent to the model.
    pub prompt: &'static str,
}

/// Preset that casts two uploaded people as opposing fighters.
pub const DUAL_PORTRAIT_PRESET_ID: &str = "martial-arcade";

/// Context line sent with the two photos of the dual-portrait preset.
pub const DUAL_PORTRAIT_NOTE: &str = "First uploaded photo represents Player 1 (left fighter). Second uploaded photo represents Player 2 (right fighter).";

const PREVIEW_CHARS: usize = 100;

impl PromptPreset {
    /// Returns true if the preset needs a second photo.
    pub fn requires_second_image(&self) -> bool {
        self.id == DUAL_PORTRAIT_PRESET_ID
    }

    /// Whitespace-collapsed prompt, cut to 100 characters.
    pub fn preview(&self) -> String {
        let condensed = self.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        if condensed.chars().count() <= PREVIEW_CHARS {
            condensed
        } else {
            let cut: String = condensed.chars().take(PREVIEW_CHARS).collect();
            format!("{cut}…")
        }
    }

    fn matches(&self, needle: &str) -> bool {
        format!("{} {} {}", self.label, self.prompt, self.id)
            .to_lowercase()
            .contains(needle)
    }
}

/// Returns every preset.
pub fn presets() -> &'static [PromptPreset] {
    PRESETS
}

/// Looks up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static PromptPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Presets in the given category, in catalogue order.
pub fn presets_in(category: PresetCategory) -> impl Iterator<Item = &'static PromptPreset> {
    PRESETS.iter().filter(move |p| p.category == category)
}

/// Case-insensitive search over label, prompt and id. A blank query
/// matches everything.
pub fn search_presets(query: &str) -> Vec<&'static PromptPreset> {
    let needle = query.trim().to_lowercase();
    PRESETS
        .iter()
        .filter(|p| needle.is_empty() || p.matches(&needle))
        .collect()
}

static PRESETS: &[PromptPreset] = &[
    PromptPreset {
        id: "figurine",
        label: "1/7 scale desktop figurine",
        category: PresetCategory::Creative,
        prompt: "Render a high-resolution photo of a 1/7 scale, fully commercialized figurine based on the character(s) in the uploaded image. Place the collectible on a modern computer desk inside a real-world studio environment with soft key and rim lighting. Keep the sculpt faithful to the original pose, costume, and likeness, but translate materials into premium painted PVC with subtle weathering. Mount the figure on a round, transparent acrylic base. Show the computer monitor displaying the 3D modeling viewport of this same figurine, and stage a deluxe packaging box beside it featuring flat, illustrated box art inspired by top-tier collectibles. Emphasize tangible materials, lens depth of field, and natural reflections.",
    },
    PromptPreset {
        id: "mono-top-angle-portrait",
        label: "Top-angle monochrome portrait",
        category: PresetCategory::Creative,
        prompt: "Top-angle, close-up black-and-white portrait of the uploaded subject captured with a 35mm lens aesthetic. Keep only the face, upper chest, and one shoulder in frame, facing forward with a proud, composed expression. Use crisp 10.7K 4HD quality, sculpting dramatic contrast with soft key light and deep black shadows that dissolve into the background. Emphasize precise skin texture, subtle monochrome tonality, and clean studio styling while avoiding any props or additional scenery.",
    },
    PromptPreset {
        id: "avatar-grid",
        label: "3x3 hairstyle avatar grid",
        category: PresetCategory::Business,
        prompt: "Produce a polished 3x3 grid of square avatar portraits of the same person. Keep consistent studio lighting, a soft gradient background, and uniform framing. Vary the hairstyle dramatically in each tile, changing length, color, and styling accessories while preserving facial features, skin tone, and expression continuity. Output as a single cohesive grid image with thin dividers.",
    },
    PromptPreset {
        id: "studio-strip-grid",
        label: "3x3 studio photo strips",
        category: PresetCategory::Creative,
        prompt: "Turn the uploaded photo into a contact-sheet style 3x3 grid composed of narrow vertical photo strips. Maintain consistent high-end studio lighting, seamless neutral backdrops, and coordinated wardrobe styling throughout. In each strip, direct the subject through a different pose and facial expression that feels suitable for professional headshots, editorial portraits, or fashion lookbooks. Balance the grid with thin white gutters, subtle film-edge markings, and natural skin retouching while preserving likeness. Deliver as one unified layout with crisp resolution.",
    },
    PromptPreset {
        id: "lego-pack",
        label: "LEGO minifigure packaging",
        category: PresetCategory::Creative,
        prompt: "Reimagine the subject as a LEGO minifigure product hero shot rendered in glossy, high-resolution 3D. Present an isometric packaging box with bold branding, age rating, and illustrated character art on the panels. Inside the box window, showcase the customized minifigure plus essential accessories inspired by the person's signature items (makeup, bags, tools, etc.). Beside the packaging, display the actual assembled minifigure posed on a reflective surface. Keep colors saturated, lighting cinematic, and the overall composition sharp and realistic.",
    },
    PromptPreset {
        id: "city-selfie",
        label: "Giant selfie city construction",
        category: PresetCategory::Fantasy,
        prompt: "Create a hyper-realistic large-format render of the person as a towering giant taking a smartphone selfie in the center of a city square. Surround the figure with dense scaffolding populated by tiny construction workers actively detailing the surface. Fill the environment with modern glass buildings, moving buses and cars, scattered pedestrians, street furniture, and a vibrant blue daylight sky. Maintain photo-real textures on skin, clothing, and infrastructure, with dramatic cinematic lighting and crisp depth of field.",
    },
    PromptPreset {
        id: "retro-platformer",
        label: "16-bit platformer hero",
        category: PresetCategory::Creative,
        prompt: "Recreate the uploaded character as the pixel-perfect protagonist of a side-scrolling 16-bit platformer. Translate their outfit, silhouette, and signature props into vibrant 32x48-pixel sprite sheets with exaggerated key poses for idle, run, jump, and attack animations. Render them mid-action on a multi-layer parallax level that matches their personality—include foreground platforms, collectible items, and distant background scenery painted in saturated dusk colors. Apply authentic SNES/Genesis-era color palettes, tile-based textures, and limited yet expressive shading while preserving facial likeness and iconic details. Frame the final image like a captured gameplay screenshot with retro UI elements such as hearts, score, and stage title.",
    },
    PromptPreset {
        id: "bikkuriman-sticker",
        label: "Holographic retro sticker",
        category: PresetCategory::Creative,
        prompt: "Transform the subject into a retro 1980s Japanese Bikkuriman-style holographic sticker illustration. Depict the character as a super-deformed hero with a large head, compact body, and exaggerated expression, holding a symbolic accessory that reflects their personality. Surround them with bold katakana nameplates, radiant gold halos, and energetic onomatopoeia bursts rendered in thick cel-shaded outlines. Place the figure against a prismatic foil background with rainbow gradients, glittering stars, and embossed borders. Keep the overall composition as a perfectly centered 48mm square sticker that fills the frame edge-to-edge with no white borders or blank space, crisp and vibrant, evoking collector-grade printing.",
    },
    PromptPreset {
        id: "pirate-wanted",
        label: "Pirate wanted poster",
        category: PresetCategory::Fantasy,
        prompt: "Design an aged pirate wanted poster painted on distressed parchment. Preserve the subject's likeness while giving them authentic pirate styling such as a weathered tricorne hat, braids, and accessories. Use warm brown monochrome inks with watercolor bleeding, torn edges, and creases. Feature a large, close-up portrait centered near the top. Add a prominent fictitious bounty amount in an invented currency, and beneath it a short description of alleged crimes written in an original runic-style script (avoid English or Chinese characters). Include ornamental flourishes and stamp marks that feel hand-printed.",
    },
    PromptPreset {
        id: "martial-arcade",
        label: "Versus fighting game key art",
        category: PresetCategory::Fantasy,
        prompt: "Stage a cinematic versus fighting game key art featuring the person from the first uploaded photo as Player 1 on the left and the second uploaded photo as Player 2 on the right. Capture both at a dynamic three-quarter angle mid-action with motion trails, energy effects, and expressive poses. Use a collapsing ruin environment on a purple alien world at sunrise, with dust, debris, and volumetric light. Overlay polished HUD elements: the title 'MORDON V'S DEATHSEED', health bars with character thumbnails, combo meters, and sparks. Render as a single ultra-sharp frame with dramatic contrast and vivid color grading.",
    },
    PromptPreset {
        id: "passport-blue",
        label: "Business ID photo",
        category: PresetCategory::Business,
        prompt: "Generate a professional 2-inch ID portrait cropped from the original image. Center the subject from the shoulders up, facing forward with a relaxed, friendly expression. Dress them in formal business attire, tidy hair, and minimal accessories. Use an even, solid blue background with soft studio lighting, no harsh shadows, and crisp focus.",
    },
    PromptPreset {
        id: "manga-line-art",
        label: "Monochrome manga line art",
        category: PresetCategory::Creative,
        prompt: "Convert the source photo into high-contrast black-and-white manga line art. Keep the subject's facial proportions accurate while stylizing with clean inked outlines, controlled hatching, and dynamic screentone shading for volume. Use bold line-weight variation, crisp highlights, and background speed lines or minimal panels that emphasize mood. Avoid grayscale gradients; rely solely on pure black and white.",
    },
    PromptPreset {
        id: "superhero-strip",
        label: "Superhero comic strip",
        category: PresetCategory::Fantasy,
        prompt: "Transform the uploaded image into a vibrant four-panel superhero comic strip. Develop a concise storyline with setup, rising action, climax, and resolution across the panels. Retain the subject's likeness as the protagonist, giving them a heroic costume and expressive poses. Include speech balloons, narration boxes, and sound effects with thoughtful typography. Apply bold halftone textures, dramatic lighting, and saturated comic-book coloring while keeping panel gutters clean and balanced.",
    },
    PromptPreset {
        id: "movie-poster",
        label: "Subway movie poster",
        category: PresetCategory::Creative,
        prompt: "Design a photorealistic movie poster inspired by the tone of the source image. Preserve the subject's core styling and likeness while allowing pose and expression adjustments for dramatic composition. Blend cinematic lighting, atmospheric effects, and supporting characters or set pieces that enhance the narrative. Present the finished poster mounted within a Japanese subway underground passage, with passersby, tiled walls, reflections, and ambient lighting creating realism. Include professional typography for the film title, credits block, and subtle marketing details integrated into the scene.",
    },
    PromptPreset {
        id: "beach-bottle",
        label: "1/7 scale bottled beach diorama",
        category: PresetCategory::Creative,
        prompt: "Craft a premium 1/7 scale collectible diorama of the subject displayed inside a clear souvenir glass bottle. Sculpt the figure in a relaxed beach pose surrounded by fine sand, seashells, gentle surf, driftwood, and miniature tropical foliage. Light the scene with warm, directional sunlight casting soft shadows and caustic reflections through the glass. Place the bottle on an elegant wooden base with subtle reflections and maintain sharp, realistic textures on the figure and environment.",
    },
    PromptPreset {
        id: "age-progression",
        label: "Life-stage age progression collage",
        category: PresetCategory::Creative,
        prompt: "Produce a single ultra-high-resolution horizontal collage featuring five evenly spaced portraits of the same person at ages 5, 15, 25, 45, and 65. Maintain identical camera framing, straight-on head-and-shoulders, with soft, diffused studio lighting against a smooth warm-gray seamless backdrop. Ensure facial structure, eye color, and defining traits remain consistent while reflecting natural age progression in skin texture, hairstyle, and wardrobe appropriate to each life stage. Separate panels with slim white dividers and hand-lettered age labels centered beneath each portrait.",
    },
    PromptPreset {
        id: "retro-yearbook",
        label: "90s yearbook spread",
        category: PresetCategory::Creative,
        prompt: "Convert the original photo into a 1990s American high school yearbook double-page spread featuring two coordinated photos. Include a formal senior portrait on the left and a candid hallway snapshot on the right. Use teal and magenta gradient backdrops, geometric divider bars, doodle accents, and a playful neon hand-written signature with an upbeat senior quote. Style clothing, hair, and accessories to feel authentically 90s while preserving the subject's likeness. Lay out the spread with print-ready typography and light halftone texture.",
    },
    PromptPreset {
        id: "global-magazine-cover",
        label: "Global magazine cover",
        category: PresetCategory::Business,
        prompt: "Design a glossy international fashion magazine cover starring the subject. Dress them in avant-garde couture with confident posing and dramatic studio lighting against a minimalist color-blocked background. Maintain precise facial likeness and premium retouching. Add multilingual cover lines, barcode, issue date, and a sophisticated masthead, arranging typography to balance negative space. Apply subtle texture, shadows, and highlights so the cover feels ready for newsstand printing.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_preset_ids_are_unique() {
        let ids: HashSet<_> = presets().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), presets().len());
    }

    #[test]
    fn test_every_category_has_presets() {
        for category in PresetCategory::ALL {
            assert!(presets_in(category).count() > 0, "{category}");
        }
    }

    #[test]
    fn test_find_preset() {
        let preset = find_preset("passport-blue").unwrap();
        assert_eq!(preset.category, PresetCategory::Business);
        assert!(!preset.requires_second_image());
        assert!(find_preset("missing").is_none());
        assert!(find_preset(DUAL_PORTRAIT_PRESET_ID)
            .unwrap()
            .requires_second_image());
    }

    #[test]
    fn test_search_presets() {
        let hits = search_presets("  LEGO ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "lego-pack");
        assert_eq!(search_presets("").len(), presets().len());
        assert!(search_presets("no such words here").is_empty());
    }

    #[test]
    fn test_preview_is_truncated() {
        let preview = find_preset("figurine").unwrap().preview();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(preview.ends_with('…'));
    }
}
