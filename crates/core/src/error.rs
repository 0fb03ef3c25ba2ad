//! Error taxonomy shared by the engine crates

use thiserror::Error;

/// Engine errors
///
/// Only `DictionaryLoad` and `Config` are fatal, and only at startup. The
/// per-request variants are caught at the control engine boundary and turned
/// into a fallback response. A missing match is not an error at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dictionary load error: {0}")]
    DictionaryLoad(String),

    #[error("Session state corruption in {session_id}: {reason}")]
    SessionStateCorruption { session_id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error must abort process initialization
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DictionaryLoad(_) | Error::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
