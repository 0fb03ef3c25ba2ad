//! Configuration management for the habla dialogue engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (`HABLA__` prefix, `__` separator)
//!
//! # Dictionary sources
//!
//! The declarative dictionary (patterns, responses, intents and slots) is a
//! separate YAML or JSON file, see [`DictionarySource`]. Its location comes
//! from `dictionary.path`.

pub mod dictionary;
pub mod settings;

pub use dictionary::{DictionarySource, EntryDefinition, IntentDefinition, SlotDefinition, SlotKind};
pub use settings::{
    load_settings, ControlConfig, DictionaryConfig, MatcherConfig, NlpConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
