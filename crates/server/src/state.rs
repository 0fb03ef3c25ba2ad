//! Application state

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use habla_agent::ControlEngine;
use habla_config::Settings;
use habla_core::LanguageAnalyzer;
use habla_dictionary::{DictionaryStore, Matcher};
use habla_text_processing::{Normalizer, SpanishAnalyzer};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration the server was started with
    pub config: Arc<Settings>,
    /// Dialogue engine and its session registry
    pub engine: Arc<ControlEngine>,
    /// Prometheus handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Settings, engine: Arc<ControlEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Build the analyzer, dictionary and engine described by `settings`
    ///
    /// Fails if the lexicon or the dictionary cannot be loaded.
    pub fn from_settings(settings: Settings) -> Result<Self, habla_core::Error> {
        let analyzer =
            SpanishAnalyzer::with_lexicon_path(settings.nlp.lexicon_path.as_deref().map(Path::new))?;
        tracing::info!(
            analyzer = analyzer.name(),
            language = analyzer.language(),
            forms = analyzer.lexicon().form_count(),
            "Language analyzer ready"
        );

        let store = DictionaryStore::load_path(&settings.dictionary.path)?;
        tracing::info!(
            path = %settings.dictionary.path,
            entries = store.len(),
            intents = store.intents().count(),
            "Dictionary loaded"
        );

        let normalizer = Normalizer::new(Arc::new(analyzer), settings.nlp.max_input_chars);
        let engine = ControlEngine::new(
            normalizer,
            Arc::new(store),
            Matcher::new(settings.matcher),
            settings.control.clone(),
        );

        Ok(Self::new(settings, Arc::new(engine)))
    }
}
