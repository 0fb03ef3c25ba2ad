//! Dictionary store and matcher
//!
//! - [`Pattern`]: the parsed form of a dictionary pattern (`lemma`,
//!   `lemma/POS`, `<POS|POS>`, `*`)
//! - [`DictionaryStore`]: validated entries indexed by lemma and by POS,
//!   plus the intent and slot definitions they refer to
//! - [`Matcher`]: scores candidate entries against an utterance and picks
//!   the best one above the configured threshold
//!
//! The store is built once from a [`habla_config::DictionarySource`] and is
//! read-only afterwards; share it behind an `Arc`.

pub mod matcher;
pub mod pattern;
pub mod store;

pub use matcher::{MatchResult, Matcher};
pub use pattern::{Pattern, PatternElement, PatternError};
pub use store::{DictionaryEntry, DictionaryStore};

use thiserror::Error;

/// Dictionary load failures. All of them are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("cannot read dictionary: {0}")]
    Source(String),

    #[error("entry {entry}: invalid pattern: {source}")]
    InvalidPattern { entry: usize, source: PatternError },

    #[error("entry {entry}: undefined intent '{intent}'")]
    UndefinedIntent { entry: usize, intent: String },

    #[error("entry {entry}: no responses and intent does not collect slots")]
    NoResponses { entry: usize },

    #[error("intent '{intent}': undefined slot '{slot}'")]
    UndefinedSlot { intent: String, slot: String },

    #[error("intent '{0}' requires slots but has no confirmation")]
    MissingConfirmation(String),

    #[error("duplicate intent '{0}'")]
    DuplicateIntent(String),

    #[error("slot '{0}' has no prompt")]
    MissingPrompt(String),

    #[error("slot '{0}' is one_of but lists no values")]
    MissingValues(String),

    #[error("duplicate slot '{0}'")]
    DuplicateSlot(String),
}

impl From<habla_config::ConfigError> for DictionaryError {
    fn from(err: habla_config::ConfigError) -> Self {
        DictionaryError::Source(err.to_string())
    }
}

impl From<DictionaryError> for habla_core::Error {
    fn from(err: DictionaryError) -> Self {
        habla_core::Error::DictionaryLoad(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DictionaryError>;
