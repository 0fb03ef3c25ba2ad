//! Utterance normalization
//!
//! Runs the shared language analyzer over raw user text and produces the
//! canonical [`Utterance`] the matcher and the slot extractor consume.
//! Surfaces and lemmas are lower-cased and punctuation tokens are dropped.
//! Symbols and numbers are kept.

use std::sync::Arc;

use habla_core::{LanguageAnalyzer, Token, Utterance};

use crate::{Result, TextProcessingError};

pub struct Normalizer {
    analyzer: Arc<dyn LanguageAnalyzer>,
    max_input_chars: usize,
}

impl Normalizer {
    pub fn new(analyzer: Arc<dyn LanguageAnalyzer>, max_input_chars: usize) -> Self {
        Self {
            analyzer,
            max_input_chars,
        }
    }

    pub fn analyzer(&self) -> &Arc<dyn LanguageAnalyzer> {
        &self.analyzer
    }

    /// Normalize raw text
    ///
    /// Fails on empty or whitespace-only input, on input without any
    /// alphanumeric character and on input longer than the configured limit.
    /// Deterministic: equal input always yields an equal utterance.
    pub fn normalize(&self, raw: &str) -> Result<Utterance> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TextProcessingError::Empty);
        }

        let len = trimmed.chars().count();
        if len > self.max_input_chars {
            return Err(TextProcessingError::TooLong {
                len,
                max: self.max_input_chars,
            });
        }

        if !trimmed.chars().any(char::is_alphanumeric) {
            return Err(TextProcessingError::NonTextual);
        }

        let tokens: Vec<Token> = self
            .analyzer
            .analyze(trimmed)
            .into_iter()
            .filter(|t| !t.pos.is_punctuation())
            .map(|t| Token::new(t.surface.to_lowercase(), t.lemma.to_lowercase(), t.pos))
            .collect();

        if tokens.is_empty() {
            return Err(TextProcessingError::NonTextual);
        }

        tracing::trace!(
            tokens = tokens.len(),
            lemmas = ?tokens.iter().map(|t| t.lemma.as_str()).collect::<Vec<_>>(),
            "Normalized utterance"
        );

        Ok(Utterance::new(trimmed, tokens))
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("analyzer", &self.analyzer.name())
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}
