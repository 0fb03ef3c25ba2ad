//! Text processing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextProcessingError {
    #[error("empty input")]
    Empty,

    #[error("input contains no alphanumeric characters")]
    NonTextual,

    #[error("input too long: {len} characters (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("lexicon error: {0}")]
    Lexicon(String),
}

impl TextProcessingError {
    /// Rejected user input, as opposed to a broken model
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Lexicon(_))
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;

impl From<TextProcessingError> for habla_core::Error {
    fn from(err: TextProcessingError) -> Self {
        match err {
            TextProcessingError::Lexicon(msg) => habla_core::Error::Config(msg),
            other => habla_core::Error::InvalidInput(other.to_string()),
        }
    }
}
