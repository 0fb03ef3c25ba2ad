//! Dictionary source schema
//!
//! The declarative data the dictionary store is built from. Patterns are kept
//! as written here; parsing and validation happen in the dictionary crate so
//! that every structural error surfaces as a dictionary load error.
//!
//! ```yaml
//! slots:
//!   - name: fecha
//!     kind: date
//!     prompt: "¿Para qué día?"
//! intents:
//!   - name: reservar
//!     required_slots: [fecha]
//!     confirmation: "Reserva hecha para el {fecha}."
//! entries:
//!   - pattern: ["hola"]
//!     responses: ["¡Hola! ¿En qué puedo ayudarte?"]
//!     intent: saludo
//!   - pattern: ["querer", "reservar"]
//!     intent: reservar
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Complete dictionary file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionarySource {
    /// Slot definitions
    #[serde(default)]
    pub slots: Vec<SlotDefinition>,
    /// Intent definitions
    #[serde(default)]
    pub intents: Vec<IntentDefinition>,
    /// Pattern entries, in load order
    #[serde(default)]
    pub entries: Vec<EntryDefinition>,
}

impl DictionarySource {
    /// Load from a YAML or JSON file (chosen by extension, YAML otherwise)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let source = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        tracing::debug!(
            path = %path.display(),
            entries = source.entries.len(),
            intents = source.intents.len(),
            slots = source.slots.len(),
            "Read dictionary source"
        );

        Ok(source)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn get_intent(&self, name: &str) -> Option<&IntentDefinition> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn get_slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Pattern entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDefinition {
    /// Pattern elements: `lemma`, `lemma/POS`, `<POS|POS>` or `*`
    pub pattern: Vec<String>,
    /// Response templates, rotated per turn
    #[serde(default)]
    pub responses: Vec<String>,
    /// Intent tag
    #[serde(default)]
    pub intent: Option<String>,
}

/// Intent definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    /// Intent name (identifier)
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Slots to fill before the intent is fulfilled, in asking order
    #[serde(default)]
    pub required_slots: Vec<String>,
    /// Template rendered once every required slot is filled
    #[serde(default)]
    pub confirmation: Option<String>,
    /// Matching this intent closes the conversation
    #[serde(default)]
    pub ends_conversation: bool,
}

impl IntentDefinition {
    pub fn requires_slots(&self) -> bool {
        !self.required_slots.is_empty()
    }
}

/// Kind of value a slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Weekday, relative day, `15 de marzo`, `15/03/2025`
    Date,
    /// `18:30`, `a las 5`
    Time,
    /// First number in the utterance
    Number,
    /// Free text (content words)
    Text,
    /// One of the listed lemmas
    OneOf,
}

/// Slot definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,
    pub kind: SlotKind,
    /// Question asked while the slot is pending
    #[serde(default)]
    pub prompt: String,
    /// Accepted lemmas for `one_of`
    #[serde(default)]
    pub values: Vec<String>,
}
