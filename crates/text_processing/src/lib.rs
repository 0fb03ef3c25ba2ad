//! Text processing for the habla dialogue engine
//!
//! This crate turns raw user text into something the matcher can work with:
//! - **Spanish analysis**: tokenization, lemmatization and coarse POS tagging
//!   backed by an embedded lexicon ([`SpanishAnalyzer`])
//! - **Normalization**: analyzer output → [`habla_core::Utterance`]
//!   ([`Normalizer`])
//! - **Slot extraction**: dates, times, numbers, closed value sets and free
//!   text from an utterance ([`SlotExtractor`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use habla_text_processing::{Normalizer, SpanishAnalyzer};
//!
//! let analyzer = Arc::new(SpanishAnalyzer::new()?);
//! let normalizer = Normalizer::new(analyzer, 2000);
//!
//! let utterance = normalizer.normalize("Quiero reservar")?;
//! assert_eq!(utterance.lemmas(), vec!["querer", "reservar"]);
//! ```

pub mod normalizer;
pub mod slot_extraction;
pub mod spanish;

mod error;

pub use error::{Result, TextProcessingError};
pub use normalizer::Normalizer;
pub use slot_extraction::SlotExtractor;
pub use spanish::{word_to_number, Lexicon, SpanishAnalyzer};
