//! Core traits and types for the habla dialogue engine
//!
//! This crate provides foundational types used across all other crates:
//! - Linguistic types (tokens, coarse part-of-speech tags, utterances)
//! - The `LanguageAnalyzer` trait, the seam to the pre-trained language model
//! - The error taxonomy shared by the engine

pub mod error;
pub mod language;
pub mod traits;

pub use error::{Error, Result};
pub use language::{PartOfSpeech, Token, Utterance};
pub use traits::LanguageAnalyzer;
