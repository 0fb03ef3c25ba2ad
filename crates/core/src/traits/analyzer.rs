//! Language analyzer trait
//!
//! The analyzer is the pre-trained linguistic model the normalizer consumes.
//! It is built once at process start, shared behind an `Arc`, and only ever
//! read, so implementations must be `Send + Sync` and free of interior
//! mutation on the analysis path.

use crate::language::Token;

/// Tokenizer + lemmatizer + part-of-speech tagger
pub trait LanguageAnalyzer: Send + Sync {
    /// Analyze text into tokens in original order
    ///
    /// Punctuation is returned as `PartOfSpeech::Punct` tokens; callers decide
    /// whether to keep them. Surfaces keep their original casing.
    fn analyze(&self, text: &str) -> Vec<Token>;

    /// Language code of the model (e.g. "es")
    fn language(&self) -> &str;

    /// Model name for logs and readiness reporting
    fn name(&self) -> &str;
}
