//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode
    Staging,
    /// Production mode
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language analysis and normalization
    #[serde(default)]
    pub nlp: NlpConfig,

    /// Dictionary source
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Match scoring
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Dialogue control and session policy
    #[serde(default)]
    pub control: ControlConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout enforced by the serving layer
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout_seconds(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Language analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Model language code
    #[serde(default = "default_language")]
    pub language: String,
    /// Extra lexicon merged over the embedded one
    #[serde(default)]
    pub lexicon_path: Option<String>,
    /// Longest accepted input, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_language() -> String {
    "es".to_string()
}

fn default_max_input_chars() -> usize {
    2000
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            lexicon_path: None,
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// Dictionary source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// YAML or JSON dictionary file
    #[serde(default = "default_dictionary_path")]
    pub path: String,
}

fn default_dictionary_path() -> String {
    "config/dictionaries/default.yaml".to_string()
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            path: default_dictionary_path(),
        }
    }
}

/// Match scoring configuration
///
/// Scores are integer sums of per-element credits, so the threshold boundary
/// is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Credit for a token whose lemma equals the pattern lemma
    #[serde(default = "default_lemma_weight")]
    pub lemma_weight: u32,
    /// Credit for a token matched only by part of speech
    #[serde(default = "default_pos_weight")]
    pub pos_weight: u32,
    /// Credit for a token consumed by a wildcard
    #[serde(default = "default_wildcard_weight")]
    pub wildcard_weight: u32,
    /// Lowest accepted score (inclusive)
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

fn default_lemma_weight() -> u32 {
    10
}

fn default_pos_weight() -> u32 {
    4
}

fn default_wildcard_weight() -> u32 {
    1
}

fn default_min_score() -> u32 {
    10
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            lemma_weight: default_lemma_weight(),
            pos_weight: default_pos_weight(),
            wildcard_weight: default_wildcard_weight(),
            min_score: default_min_score(),
        }
    }
}

/// Dialogue control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Reply when nothing matches or the input is unusable
    #[serde(default = "default_fallback_response")]
    pub fallback_response: String,
    /// Reply to any turn on a closed conversation
    #[serde(default = "default_closed_response")]
    pub closed_response: String,
    /// Append the pending slot prompt to the fallback
    #[serde(default = "default_reprompt_on_fallback")]
    pub reprompt_on_fallback: bool,
    /// Idle time after which a session expires
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// Interval of the background eviction task
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Turns kept per session
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_fallback_response() -> String {
    "Lo siento, no te he entendido. ¿Puedes decirlo de otra forma?".to_string()
}

fn default_closed_response() -> String {
    "La conversación ha terminado. Inicia una nueva sesión para seguir hablando.".to_string()
}

fn default_reprompt_on_fallback() -> bool {
    true
}

fn default_session_timeout_secs() -> u64 {
    1800
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_history_turns() -> usize {
    10
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            fallback_response: default_fallback_response(),
            closed_response: default_closed_response(),
            reprompt_on_fallback: default_reprompt_on_fallback(),
            session_timeout_secs: default_session_timeout_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            max_sessions: default_max_sessions(),
            history_turns: default_history_turns(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_nlp()?;
        self.validate_matcher()?;
        self.validate_control()?;

        if self.dictionary.path.trim().is_empty() {
            return Err(invalid("dictionary.path", "Path cannot be empty"));
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }

        if self.server.timeout_seconds == 0 {
            return Err(invalid(
                "server.timeout_seconds",
                "Timeout must be at least 1 second",
            ));
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_nlp(&self) -> Result<(), ConfigError> {
        if self.nlp.max_input_chars == 0 {
            return Err(invalid("nlp.max_input_chars", "Must be at least 1"));
        }

        if self.nlp.language != "es" {
            return Err(invalid(
                "nlp.language",
                &format!("Only 'es' is supported, got '{}'", self.nlp.language),
            ));
        }

        Ok(())
    }

    fn validate_matcher(&self) -> Result<(), ConfigError> {
        let m = &self.matcher;

        if m.lemma_weight > MAX_MATCH_WEIGHT {
            return Err(invalid(
                "matcher.lemma_weight",
                &format!("Must be at most {}, got {}", MAX_MATCH_WEIGHT, m.lemma_weight),
            ));
        }

        if m.pos_weight == 0 || m.wildcard_weight == 0 {
            return Err(invalid(
                "matcher.pos_weight",
                "POS and wildcard weights must be at least 1",
            ));
        }

        if m.lemma_weight <= m.pos_weight {
            return Err(invalid(
                "matcher.lemma_weight",
                &format!(
                    "Must be greater than pos_weight ({}), got {}",
                    m.pos_weight, m.lemma_weight
                ),
            ));
        }

        if m.wildcard_weight >= m.lemma_weight {
            return Err(invalid(
                "matcher.wildcard_weight",
                &format!(
                    "Must be lower than lemma_weight ({}), got {}",
                    m.lemma_weight, m.wildcard_weight
                ),
            ));
        }

        if m.min_score == 0 {
            return Err(invalid("matcher.min_score", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_control(&self) -> Result<(), ConfigError> {
        let c = &self.control;

        if c.fallback_response.trim().is_empty() {
            return Err(invalid("control.fallback_response", "Cannot be empty"));
        }

        if c.closed_response.trim().is_empty() {
            return Err(invalid("control.closed_response", "Cannot be empty"));
        }

        if c.session_timeout_secs == 0 {
            return Err(invalid("control.session_timeout_secs", "Must be at least 1"));
        }

        if c.cleanup_interval_secs == 0 {
            return Err(invalid("control.cleanup_interval_secs", "Must be at least 1"));
        }

        if c.max_sessions == 0 {
            return Err(invalid("control.max_sessions", "Must be at least 1"));
        }

        if c.history_turns == 0 {
            return Err(invalid("control.history_turns", "Must be at least 1"));
        }

        Ok(())
    }
}

/// Upper bound for any single matcher weight
pub const MAX_MATCH_WEIGHT: u32 = 1_000;

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("HABLA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
