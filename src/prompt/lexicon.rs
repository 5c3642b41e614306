use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

const SOMATIC_RULES: &[(&str, &str)] = &[
    (
        "heavy",
        "monumental weighted forms, dense charcoal shading, figures sinking under gravity, low horizon",
    ),
    (
        "spiky",
        "jagged crystalline shards, barbed angular geometry, high contrast edges",
    ),
    (
        "hollow",
        "vast empty interior, a single hollow vessel, echoing void, muted greys",
    ),
    (
        "burning",
        "molten embers, searing orange and crimson flames, heat haze distortion",
    ),
    (
        "cloudy",
        "soft diffuse fog banks, veiled silhouettes, overcast pearl light",
    ),
    (
        "shattered",
        "fractured glass mosaic, scattered fragments suspended mid-air, kintsugi seams",
    ),
    (
        "blooming",
        "unfurling petals, organic spirals, botanical growth bursting from stone",
    ),
    (
        "racing",
        "motion blur streaks, futurist speed lines, repeating overlapping silhouettes",
    ),
    (
        "tight",
        "compressed claustrophobic framing, coiled ropes, knotted tension lines",
    ),
    (
        "numb",
        "frosted desaturated surfaces, glassy stillness, frozen lake under pale light",
    ),
];

const ANXIETY_FRAGMENT: &str = "abstract expressionism, jackson pollock style, chaotic jagged lines, high contrast, visual noise, glitch art aesthetics";
const SADNESS_FRAGMENT: &str = "minimalist, blue period picasso, edward hopper style, vast empty negative space, cold color palette, solitude, melancholic atmosphere";
const ANGER_FRAGMENT: &str = "francis bacon style, distorted forms, crimson and obsidian palette, sharp aggressive brushstrokes, intense turbulence";
const JOY_FRAGMENT: &str = "impressionist, claude monet style, blooming organic shapes, warm golden hour lighting, pastel colors, harmonious composition";
const FEAR_FRAGMENT: &str = "german expressionism, edvard munch style, distorted shadows, dark moody atmosphere, unease, surrealism";

const EMOTION_RULES: &[(&str, &str)] = &[
    ("anx", ANXIETY_FRAGMENT),
    ("panic", ANXIETY_FRAGMENT),
    ("stress", ANXIETY_FRAGMENT),
    ("sad", SADNESS_FRAGMENT),
    ("depress", SADNESS_FRAGMENT),
    ("lonely", SADNESS_FRAGMENT),
    ("ang", ANGER_FRAGMENT),
    ("rag", ANGER_FRAGMENT),
    ("mad", ANGER_FRAGMENT),
    ("happy", JOY_FRAGMENT),
    ("joy", JOY_FRAGMENT),
    ("hope", JOY_FRAGMENT),
    ("fear", FEAR_FRAGMENT),
    ("scared", FEAR_FRAGMENT),
];

pub const PEAK_FRAGMENT: &str =
    "hyper-intense, explosive, dramatic lighting, 8k resolution, intricate detail";
pub const VIVID_FRAGMENT: &str = "vivid, highly detailed, sharp focus";
pub const MUTED_FRAGMENT: &str = "soft, muted colors, ethereal, dreamlike, diffuse lighting";
pub const FALLBACK_FRAGMENT: &str =
    "surrealism, salvador dali style, symbolic, conceptual art, deep meaning, evocative";

/// One `(keyword, fragment)` entry. Keywords are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub keyword: String,
    pub fragment: String,
}

impl StyleRule {
    fn new(keyword: &str, fragment: &str) -> Option<Self> {
        let keyword = keyword.trim().to_lowercase();
        let fragment = fragment.trim();
        if keyword.is_empty() || fragment.is_empty() {
            return None;
        }
        Some(Self {
            keyword,
            fragment: fragment.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandFragments {
    pub peak: String,
    pub vivid: String,
    pub muted: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    pub somatic: Vec<StyleRule>,
    pub emotion: Vec<StyleRule>,
    pub bands: BandFragments,
    pub fallback: String,
}

fn rules_from_table(table: &[(&str, &str)]) -> Vec<StyleRule> {
    table
        .iter()
        .filter_map(|(keyword, fragment)| StyleRule::new(keyword, fragment))
        .collect()
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            somatic: rules_from_table(SOMATIC_RULES),
            emotion: rules_from_table(EMOTION_RULES),
            bands: BandFragments {
                peak: PEAK_FRAGMENT.to_string(),
                vivid: VIVID_FRAGMENT.to_string(),
                muted: MUTED_FRAGMENT.to_string(),
            },
            fallback: FALLBACK_FRAGMENT.to_string(),
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    somatic: Option<Vec<LexiconRuleEntry>>,
    #[serde(default)]
    emotion: Option<Vec<LexiconRuleEntry>>,
    #[serde(default)]
    bands: Option<LexiconBandsEntry>,
    #[serde(default)]
    fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LexiconRuleEntry {
    keyword: String,
    fragment: String,
}

#[derive(Debug, Deserialize)]
struct LexiconBandsEntry {
    #[serde(default)]
    peak: Option<String>,
    #[serde(default)]
    vivid: Option<String>,
    #[serde(default)]
    muted: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn rules_from_entries(entries: Vec<LexiconRuleEntry>) -> Vec<StyleRule> {
    entries
        .iter()
        .filter_map(|entry| StyleRule::new(&entry.keyword, &entry.fragment))
        .collect()
}

fn merge_lexicon_file(file: LexiconFile) -> Lexicon {
    let mut lexicon = Lexicon::builtin();
    if let Some(entries) = file.somatic {
        lexicon.somatic = rules_from_entries(entries);
    }
    if let Some(entries) = file.emotion {
        lexicon.emotion = rules_from_entries(entries);
    }
    if let Some(bands) = file.bands {
        if let Some(peak) = non_blank(bands.peak) {
            lexicon.bands.peak = peak;
        }
        if let Some(vivid) = non_blank(bands.vivid) {
            lexicon.bands.vivid = vivid;
        }
        if let Some(muted) = non_blank(bands.muted) {
            lexicon.bands.muted = muted;
        }
    }
    if let Some(fallback) = non_blank(file.fallback) {
        lexicon.fallback = fallback;
    }
    lexicon
}

pub fn parse_lexicon(raw: &str) -> serde_json::Result<Lexicon> {
    let file: LexiconFile = serde_json::from_str(raw)?;
    Ok(merge_lexicon_file(file))
}

/// Loads a lexicon override file, falling back to the built-in tables when
/// the file is absent or cannot be parsed.
pub fn load_lexicon_from_path(path: &Path) -> Lexicon {
    if !path.exists() {
        info!(
            "Lexicon override not found at {}; using built-in lexicon",
            path.display()
        );
        return Lexicon::builtin();
    }

    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read lexicon at {}: {}", path.display(), err);
            return Lexicon::builtin();
        }
    };

    match parse_lexicon(&raw) {
        Ok(lexicon) => {
            info!(
                "Loaded lexicon from {} ({} somatic, {} emotion rules)",
                path.display(),
                lexicon.somatic.len(),
                lexicon.emotion.len()
            );
            lexicon
        }
        Err(err) => {
            warn!("Failed to parse lexicon at {}: {}", path.display(), err);
            Lexicon::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_keeps_table_order() {
        let lexicon = Lexicon::builtin();
        let somatic: Vec<&str> = lexicon.somatic.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(&somatic[..3], &["heavy", "spiky", "hollow"]);
        assert_eq!(lexicon.emotion.first().map(|r| r.keyword.as_str()), Some("anx"));
        assert_eq!(lexicon.emotion.len(), EMOTION_RULES.len());
    }

    #[test]
    fn blank_keywords_are_dropped() {
        let lexicon = parse_lexicon(
            r#"{"somatic": [{"keyword": "  ", "fragment": "x"}, {"keyword": " Heavy ", "fragment": "stone"}]}"#,
        )
        .expect("valid lexicon json");
        assert_eq!(
            lexicon.somatic,
            vec![StyleRule {
                keyword: "heavy".to_string(),
                fragment: "stone".to_string()
            }]
        );
    }

    #[test]
    fn partial_file_keeps_builtin_sections() {
        let lexicon = parse_lexicon(r#"{"bands": {"peak": "thunder"}, "fallback": ""}"#)
            .expect("valid lexicon json");
        assert_eq!(lexicon.bands.peak, "thunder");
        assert_eq!(lexicon.bands.vivid, VIVID_FRAGMENT);
        assert_eq!(lexicon.fallback, FALLBACK_FRAGMENT);
        assert_eq!(lexicon.somatic, Lexicon::builtin().somatic);
    }

    #[test]
    fn loads_override_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"emotion": [{{"keyword": "calm", "fragment": "still water"}}]}}"#
        )
        .expect("write lexicon");

        let lexicon = load_lexicon_from_path(file.path());
        assert_eq!(lexicon.emotion.len(), 1);
        assert_eq!(lexicon.emotion[0].fragment, "still water");
    }

    #[test]
    fn unparsable_or_missing_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write lexicon");
        assert_eq!(load_lexicon_from_path(file.path()), Lexicon::builtin());

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("lexicon.json");
        assert_eq!(load_lexicon_from_path(&missing), Lexicon::builtin());
    }
}
