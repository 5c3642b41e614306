const CRISIS_KEYWORDS: &[&str] = &[
    "die",
    "kill",
    "suicide",
    "hurt myself",
    "end it",
    "death",
    "overdose",
    "cutting",
    "give up",
];

pub const DEFAULT_CRISIS_MESSAGE: &str =
    "You are not alone. Immediate help is available. Dial 988.";

#[derive(Debug, Clone)]
pub struct SafetySettings {
    pub enabled: bool,
    pub message: String,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            message: DEFAULT_CRISIS_MESSAGE.to_string(),
        }
    }
}

/// Substring screen over the lowercased text. Errs towards flagging:
/// "studied" trips "die" the same way "strangle" trips "ang" in the lexicon.
pub fn contains_crisis_language(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CRISIS_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
