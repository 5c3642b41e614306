const INSIGHT_RULES: &[(&[&str], &str)] = &[
    (
        &["heavy", "crushing"],
        "You are carrying a lot. Remember, you don't have to carry it all at once.",
    ),
    (
        &["spiky", "sharp"],
        "Anger is often a bodyguard for sadness. It's okay to lower the shield.",
    ),
    (
        &["empty", "hollow"],
        "Even a hollow space is waiting to be filled. Give yourself time.",
    ),
    (
        &["burning", "racing", "electric"],
        "This energy is intense, but like a fire, it will eventually settle into embers.",
    ),
    (
        &["foggy", "cloudy"],
        "Clarity will return. For now, it is safe to rest in the unknown.",
    ),
    (
        &["shattered", "broken"],
        "What is broken can be remade into a mosaic. You are still whole.",
    ),
    (
        &["blooming", "growing"],
        "Growth is often uncomfortable before it is beautiful.",
    ),
];

pub const DEFAULT_INSIGHT: &str =
    "Your feelings are valid. Visualizing them is the first step to understanding them.";

/// Picks the reflection shown next to a generated image. First matching
/// group wins, unlike prompt composition.
pub fn reflect_insight(feeling: &str) -> &'static str {
    let lowered = feeling.to_lowercase();
    INSIGHT_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, insight)| *insight)
        .unwrap_or(DEFAULT_INSIGHT)
}
