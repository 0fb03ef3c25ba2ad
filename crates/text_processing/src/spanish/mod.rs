//! Rule-based Spanish analyzer
//!
//! Lexicon lookup first, then suffix rules for regular verb inflection,
//! plurals and derivational suffixes. No statistical model is involved, so
//! analysis is deterministic and needs no runtime downloads.

pub mod analyzer;
pub mod lemmatizer;
pub mod lexicon;
pub mod numbers;

pub use analyzer::SpanishAnalyzer;
pub use lexicon::{fold_accents, LexEntry, Lexicon};
pub use numbers::word_to_number;
