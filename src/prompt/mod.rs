pub mod composer;
pub mod insight;
pub mod lexicon;
pub mod safety;

pub use composer::{compose_prompt, PromptComposer};
pub use insight::reflect_insight;
pub use lexicon::{load_lexicon_from_path, Lexicon};
pub use safety::{contains_crisis_language, SafetySettings};
