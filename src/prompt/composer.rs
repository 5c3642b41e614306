use once_cell::sync::Lazy;

use crate::prompt::lexicon::{Lexicon, StyleRule};

const PEAK_THRESHOLD: i64 = 85;
const VIVID_THRESHOLD: i64 = 60;

static BUILTIN_COMPOSER: Lazy<PromptComposer> = Lazy::new(PromptComposer::default);

/// Intensity bands. Out-of-range values are not clamped: negatives land in
/// `Muted`, anything above 100 in `Peak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityBand {
    Peak,
    Vivid,
    Muted,
}

impl IntensityBand {
    pub fn for_intensity(intensity: i64) -> Self {
        if intensity > PEAK_THRESHOLD {
            IntensityBand::Peak
        } else if intensity > VIVID_THRESHOLD {
            IntensityBand::Vivid
        } else {
            IntensityBand::Muted
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    lexicon: Lexicon,
}

fn collect_matches<'a>(rules: &'a [StyleRule], haystack: &str, out: &mut Vec<&'a str>) {
    for rule in rules {
        if haystack.contains(rule.keyword.as_str()) && !out.contains(&rule.fragment.as_str()) {
            out.push(rule.fragment.as_str());
        }
    }
}

impl PromptComposer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Somatic matches first, then emotion matches, each in lexicon order.
    /// Falls back to the single fallback fragment when nothing matched.
    pub fn style_fragments(&self, feeling: &str) -> Vec<&str> {
        let lowered = feeling.to_lowercase();
        let mut fragments = Vec::new();
        collect_matches(&self.lexicon.somatic, &lowered, &mut fragments);
        collect_matches(&self.lexicon.emotion, &lowered, &mut fragments);
        if fragments.is_empty() {
            fragments.push(self.lexicon.fallback.as_str());
        }
        fragments
    }

    pub fn intensity_modifier(&self, intensity: i64) -> &str {
        let bands = &self.lexicon.bands;
        match IntensityBand::for_intensity(intensity) {
            IntensityBand::Peak => bands.peak.as_str(),
            IntensityBand::Vivid => bands.vivid.as_str(),
            IntensityBand::Muted => bands.muted.as_str(),
        }
    }

    pub fn compose(&self, feeling: &str, intensity: i64) -> String {
        let style = self.style_fragments(feeling).join(", ");
        let modifier = self.intensity_modifier(intensity);
        format!(
            "A conceptual artistic representation of the emotion \"{feeling}\". Art style: {style}, {modifier}. High quality, masterpiece, trending on artstation."
        )
    }
}

/// Composes a prompt with the built-in lexicon.
pub fn compose_prompt(feeling: &str, intensity: i64) -> String {
    BUILTIN_COMPOSER.compose(feeling, intensity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::lexicon::{
        BandFragments, FALLBACK_FRAGMENT, MUTED_FRAGMENT, PEAK_FRAGMENT, VIVID_FRAGMENT,
    };

    fn fragment_for(keyword: &str) -> String {
        let lexicon = Lexicon::builtin();
        lexicon
            .somatic
            .iter()
            .chain(lexicon.emotion.iter())
            .find(|rule| rule.keyword == keyword)
            .map(|rule| rule.fragment.clone())
            .expect("keyword in builtin lexicon")
    }

    #[test]
    fn same_input_composes_identical_prompt() {
        let first = compose_prompt("Heavy but hopeful", 72);
        let second = compose_prompt("Heavy but hopeful", 72);
        assert_eq!(first, second);
    }

    #[test]
    fn unmatched_feeling_uses_only_fallback() {
        let composer = PromptComposer::default();
        assert_eq!(composer.style_fragments("quiet wonder"), vec![FALLBACK_FRAGMENT]);

        let prompt = compose_prompt("quiet wonder", 10);
        assert!(prompt.contains(&format!("Art style: {FALLBACK_FRAGMENT}, {MUTED_FRAGMENT}.")));
    }

    #[test]
    fn every_matching_keyword_contributes() {
        let heavy = fragment_for("heavy");
        let burning = fragment_for("burning");
        let prompt = compose_prompt("heavy and burning", 50);
        assert!(prompt.contains(&format!("{heavy}, {burning}")));
        assert!(!prompt.contains(FALLBACK_FRAGMENT));
    }

    #[test]
    fn somatic_matches_precede_emotion_matches() {
        let composer = PromptComposer::default();
        let fragments = composer.style_fragments("sad and heavy");
        assert_eq!(fragments, vec![fragment_for("heavy"), fragment_for("sad")]);
    }

    #[test]
    fn shared_fragments_are_collected_once() {
        let composer = PromptComposer::default();
        let fragments = composer.style_fragments("anxious, panicking, stressed");
        assert_eq!(fragments, vec![fragment_for("anx")]);
    }

    #[test]
    fn intensity_band_boundaries() {
        assert_eq!(IntensityBand::for_intensity(86), IntensityBand::Peak);
        assert_eq!(IntensityBand::for_intensity(85), IntensityBand::Vivid);
        assert_eq!(IntensityBand::for_intensity(61), IntensityBand::Vivid);
        assert_eq!(IntensityBand::for_intensity(60), IntensityBand::Muted);
        assert_eq!(IntensityBand::for_intensity(0), IntensityBand::Muted);
        assert_eq!(IntensityBand::for_intensity(-40), IntensityBand::Muted);
        assert_eq!(IntensityBand::for_intensity(250), IntensityBand::Peak);

        assert!(compose_prompt("x", 86).contains(PEAK_FRAGMENT));
        assert!(compose_prompt("x", 85).contains(VIVID_FRAGMENT));
        assert!(compose_prompt("x", 60).contains(MUTED_FRAGMENT));
    }

    #[test]
    fn matching_ignores_case_but_prompt_keeps_it() {
        let composer = PromptComposer::default();
        assert_eq!(
            composer.style_fragments("HEAVY"),
            composer.style_fragments("heavy")
        );
        assert!(compose_prompt("HEAVY", 40).contains("emotion \"HEAVY\""));
    }

    #[test]
    fn substring_matching_catches_embedded_roots() {
        let composer = PromptComposer::default();
        assert_eq!(
            composer.style_fragments("strangle"),
            vec![fragment_for("ang")]
        );
    }

    #[test]
    fn empty_feeling_still_composes() {
        let prompt = compose_prompt("", 50);
        assert_eq!(
            prompt,
            format!(
                "A conceptual artistic representation of the emotion \"\". Art style: {FALLBACK_FRAGMENT}, {MUTED_FRAGMENT}. High quality, masterpiece, trending on artstation."
            )
        );
    }

    #[test]
    fn chip_input_end_to_end() {
        let heavy = fragment_for("heavy");
        let spiky = fragment_for("spiky");
        let prompt = compose_prompt("Heavy, Spiky", 90);
        assert_eq!(
            prompt,
            format!(
                "A conceptual artistic representation of the emotion \"Heavy, Spiky\". Art style: {heavy}, {spiky}, {PEAK_FRAGMENT}. High quality, masterpiece, trending on artstation."
            )
        );
    }

    #[test]
    fn custom_lexicon_drives_composition() {
        let composer = PromptComposer::new(Lexicon {
            somatic: vec![StyleRule {
                keyword: "warm".to_string(),
                fragment: "amber glow".to_string(),
            }],
            emotion: Vec::new(),
            bands: BandFragments {
                peak: "loud".to_string(),
                vivid: "clear".to_string(),
                muted: "hushed".to_string(),
            },
            fallback: "dream".to_string(),
        });
        assert!(composer.compose("Warm hands", 70).contains("Art style: amber glow, clear."));
        assert!(composer.compose("cold", 99).contains("Art style: dream, loud."));
    }
}
