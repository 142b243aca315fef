//! Built-in remix suggestion catalog.

use rand::Rng;

use remixstudio_shared::{RemixSuggestion, SUGGESTION_SLOTS};

/// The built-in English remix suggestions as (label, prompt) pairs.
pub const CATALOG: &[(&str, &str)] = &[
    (
        "Want a wider view?",
        "Create an expanded image with extended space.",
    ),
    (
        "Want to zoom in?",
        "Create a micro-detail close-up variant of this image.",
    ),
    (
        "Try paper cut style?",
        "Remake this image in a modern paper cut style with layered colors and soft shadows.",
    ),
    (
        "Make this embroidery style?",
        "Remake this image in a textile embroidery style with visible stitched threads.",
    ),
    (
        "Change to Pixel Art",
        "Create this picture as a retro pixel art, with nostalgic detail and game shading.",
    ),
    (
        "Apply Glitch Effect",
        "Remake this image as a glitch digital art, with pixel splits and cyberpunk noise.",
    ),
    (
        "Change to Watercolor",
        "Create this picture as a watercolor painting.",
    ),
    (
        "Change to Impressionism",
        "Create this picture as an Impressionist painting, with loose brushwork, luminous color, and fleeting light.",
    ),
    (
        "Draw with colored pencil?",
        "Remake this image as a colored pencil drawing.",
    ),
    (
        "Try fine-line style?",
        "Remake this image as a Chinese Gongbi painting with precise outlines, soft washes, and detailed forms.",
    ),
    (
        "Try Chinese paper cut style?",
        "Remake this image as a Chinese paper cut, with red silhouettes, cultural motifs, and symmetrical patterns.",
    ),
    (
        "Try Ukiyo-e style?",
        "Remake this image as a Japanese Ukiyo-e, with woodblock texture, flat colors, and flowing lines.",
    ),
    (
        "Make this a portrait?",
        "Remake this image as a photo portrait, with natural light, and shallow depth.",
    ),
    (
        "Make this stained glass?",
        "Remake this image as a stained glass design with colorful panes, bold outlines, and glowing light.",
    ),
    (
        "Try silkscreen style?",
        "Remake this image as a silkscreen print.",
    ),
    (
        "Make this anime?",
        "Remake this image as an anime illustration with expressive light and a dynamic layout.",
    ),
    (
        "Add sepia tone?",
        "Remake this image as a sepia-toned memory with aged paper texture.",
    ),
    (
        "Make this pop art?",
        "Remake this image as a high-saturation pop art, with bold blocks and hues.",
    ),
    (
        "Make this a gradient mesh?",
        "Remake this image as a gradient mesh, blending colors seamlessly across the composition.",
    ),
    (
        "Make this a 3D figure?",
        "Remake this image as a photorealistic 3D render of a collectible figure, made of real materials like resin or plastic with cinematic lighting, studio backdrop, and ultra-fine modeling detail.",
    ),
    (
        "Try duotone colors?",
        "Remake this image as a duotone image.",
    ),
    (
        "Make this monochrome?",
        "Remake this image as a monochrome image.",
    ),
    (
        "Add neon lighting?",
        "Remake this image as a neon-lit scene with vibrant color contrasts.",
    ),
    (
        "Make this mechanical?",
        "Create a mechanical version of the subject with exposed gears, metallic joints, and precise components.",
    ),
    (
        "Make this crystal?",
        "Remake this image to be in an iridescent fantasy realm with the subject as translucent glass or crystal, glowing and refracted.",
    ),
];

/// Canned instructions for generating parseable remix prompts with an
/// image-capable assistant.
const ASSISTANT_INSTRUCTIONS: &str = "A remix prompt consists of a short, 2–5-word title and an instruction.
Please write 5 remix prompts for me based on the uploaded image.
Format:
Label: [Title]
Prompt: [Instruction]";

/// Instruction block users paste into an assistant to get remix prompts in
/// the format [`crate::parse_pasted`] understands.
pub fn assistant_instructions() -> &'static str {
    ASSISTANT_INSTRUCTIONS
}

/// Pick one catalog suggestion uniformly at random.
pub fn random_suggestion<R: Rng + ?Sized>(rng: &mut R) -> RemixSuggestion {
    let (label, prompt) = CATALOG[rng.gen_range(0..CATALOG.len())];
    RemixSuggestion::new(label, prompt)
}

/// Fill all suggestion slots with random catalog picks.
pub fn random_slots<R: Rng + ?Sized>(rng: &mut R) -> Vec<RemixSuggestion> {
    (0..SUGGESTION_SLOTS).map(|_| random_suggestion(rng)).collect()
}

/// Normalize a parsed suggestion list to exactly [`SUGGESTION_SLOTS`] entries:
/// surplus entries are dropped, missing slots filled with random picks.
pub fn pad_to_slots<R: Rng + ?Sized>(
    mut items: Vec<RemixSuggestion>,
    rng: &mut R,
) -> Vec<RemixSuggestion> {
    items.truncate(SUGGESTION_SLOTS);
    while items.len() < SUGGESTION_SLOTS {
        items.push(random_suggestion(rng));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn catalog_is_well_formed() {
        assert_eq!(CATALOG.len(), 25);
        for (label, prompt) in CATALOG {
            assert!(!label.is_empty());
            assert!(!prompt.is_empty());
        }
    }

    #[test]
    fn random_suggestion_comes_from_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = random_suggestion(&mut rng);
            assert!(
                CATALOG
                    .iter()
                    .any(|(l, p)| *l == s.label && *p == s.prompt)
            );
        }
    }

    #[test]
    fn random_slots_fills_every_slot() {
        let mut rng = StdRng::seed_from_u64(7);
        let slots = random_slots(&mut rng);
        assert_eq!(slots.len(), SUGGESTION_SLOTS);
    }

    #[test]
    fn pad_truncates_surplus() {
        let mut rng = StdRng::seed_from_u64(7);
        let five = (0..5)
            .map(|i| RemixSuggestion::new(format!("l{i}"), format!("p{i}")))
            .collect();
        let slots = pad_to_slots(five, &mut rng);
        assert_eq!(slots.len(), SUGGESTION_SLOTS);
        assert_eq!(slots[0].label, "l0");
        assert_eq!(slots[2].label, "l2");
    }

    #[test]
    fn pad_fills_missing_slots_from_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        let one = vec![RemixSuggestion::new("only", "Make it bold.")];
        let slots = pad_to_slots(one, &mut rng);
        assert_eq!(slots.len(), SUGGESTION_SLOTS);
        assert_eq!(slots[0].label, "only");
        for s in &slots[1..] {
            assert!(CATALOG.iter().any(|(l, _)| *l == s.label));
        }
    }

    #[test]
    fn instructions_mention_format() {
        let text = assistant_instructions();
        assert!(text.contains("Label: [Title]"));
        assert!(text.contains("Prompt: [Instruction]"));
    }
}
