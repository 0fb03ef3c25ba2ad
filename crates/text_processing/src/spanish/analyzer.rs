//! Spanish analyzer: segmentation, lookup and tagging

use std::path::Path;

use habla_core::{LanguageAnalyzer, PartOfSpeech, Token};
use unicode_segmentation::UnicodeSegmentation;

use super::lemmatizer::{
    has_adjective_suffix, has_adverb_suffix, lemmatize_verb, looks_like_infinitive, singularize,
};
use super::lexicon::Lexicon;
use crate::Result;

/// Characters tagged `SYM` rather than `PUNCT`
const SYMBOLS: &[char] = &['€', '$', '%', '+', '=', '<', '>', '@', '#', '&', '*', '£', '°', '/'];

/// Punctuation after which the next word starts a sentence
const SENTENCE_BREAKS: &[char] = &['.', '!', '?', '¡', '¿', ':', ';'];

/// Rule-based Spanish analyzer
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct SpanishAnalyzer {
    lexicon: Lexicon,
}

impl SpanishAnalyzer {
    /// Analyzer over the embedded lexicon
    pub fn new() -> Result<Self> {
        Ok(Self {
            lexicon: Lexicon::embedded()?,
        })
    }

    /// Analyzer with an optional extra lexicon file merged over the embedded one
    pub fn with_lexicon_path(path: Option<&Path>) -> Result<Self> {
        let lexicon = match path {
            Some(path) => Lexicon::with_extra_file(path)?,
            None => Lexicon::embedded()?,
        };
        Ok(Self { lexicon })
    }

    pub fn from_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn analyze_word(&self, surface: &str, sentence_initial: bool) -> Token {
        let lower = surface.to_lowercase();

        if is_numeric(&lower) {
            return Token::new(surface, lower, PartOfSpeech::Num);
        }

        if let Some(entry) = self.lexicon.lookup(&lower) {
            return Token::new(surface, entry.lemma.clone(), entry.pos);
        }

        if let Some(infinitive) = lemmatize_verb(&self.lexicon, &lower) {
            return Token::new(surface, infinitive, PartOfSpeech::Verb);
        }

        if has_adverb_suffix(&lower) {
            return Token::new(surface, lower, PartOfSpeech::Adv);
        }

        if !sentence_initial && starts_uppercase(surface) {
            return Token::new(surface, lower, PartOfSpeech::Propn);
        }

        if looks_like_infinitive(&lower) {
            return Token::new(surface, lower, PartOfSpeech::Verb);
        }

        let lemma = match singularize(&lower) {
            Some(singular) => {
                if let Some(entry) = self.lexicon.lookup(&singular) {
                    return Token::new(surface, entry.lemma.clone(), entry.pos);
                }
                singular
            }
            None => lower,
        };

        if has_adjective_suffix(&lemma) {
            return Token::new(surface, lemma, PartOfSpeech::Adj);
        }

        Token::new(surface, lemma, PartOfSpeech::Noun)
    }
}

impl LanguageAnalyzer for SpanishAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut sentence_initial = true;

        for segment in text.split_word_bounds() {
            if segment.chars().all(char::is_whitespace) {
                continue;
            }

            if !segment.chars().any(char::is_alphanumeric) {
                let pos = if segment.chars().any(|c| SYMBOLS.contains(&c)) {
                    PartOfSpeech::Sym
                } else {
                    PartOfSpeech::Punct
                };
                if segment.chars().any(|c| SENTENCE_BREAKS.contains(&c)) {
                    sentence_initial = true;
                }
                tokens.push(Token::new(segment, segment, pos));
                continue;
            }

            tokens.push(self.analyze_word(segment, sentence_initial));
            sentence_initial = false;
        }

        tokens
    }

    fn language(&self) -> &str {
        "es"
    }

    fn name(&self) -> &str {
        "habla-es-rules"
    }
}

/// Digits with optional decimal or thousands separators
fn is_numeric(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_digit())
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}
