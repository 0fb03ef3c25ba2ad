//! Spanish lexicon
//!
//! Loads word forms from the embedded `data/es_lexicon.yaml`, optionally
//! merged with an extra lexicon file. The lexicon drives lookup for
//! closed-class words and irregular forms; adding a word is a YAML edit, not
//! a code change.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use habla_core::PartOfSpeech;
use serde::Deserialize;

use crate::TextProcessingError;

const EMBEDDED_LEXICON: &str = include_str!("../../data/es_lexicon.yaml");

#[derive(Debug, Deserialize)]
struct LexiconYaml {
    #[serde(default)]
    words: Vec<WordGroup>,
    #[serde(default)]
    verbs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WordGroup {
    lemma: String,
    pos: PartOfSpeech,
    /// Defaults to the lemma itself
    #[serde(default)]
    forms: Vec<String>,
}

/// Lexicon entry for one surface form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexEntry {
    pub lemma: String,
    pub pos: PartOfSpeech,
}

/// Form → (lemma, tag) table plus the set of known infinitives
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    forms: HashMap<String, LexEntry>,
    /// Accent-folded form → entry, consulted only when the exact form misses
    folded: HashMap<String, LexEntry>,
    /// Accent-folded infinitive → infinitive
    verbs: HashMap<String, String>,
}

impl Lexicon {
    /// Embedded Spanish lexicon
    pub fn embedded() -> Result<Self, TextProcessingError> {
        let mut lexicon = Self::default();
        lexicon.merge_yaml(EMBEDDED_LEXICON)?;
        Ok(lexicon)
    }

    /// Embedded lexicon with an extra file merged on top
    pub fn with_extra_file(path: impl AsRef<Path>) -> Result<Self, TextProcessingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TextProcessingError::Lexicon(format!("{}: {}", path.display(), e))
        })?;

        let mut lexicon = Self::embedded()?;
        lexicon.merge_yaml(&content)?;

        tracing::info!(
            path = %path.display(),
            forms = lexicon.forms.len(),
            verbs = lexicon.verbs.len(),
            "Merged extra lexicon"
        );

        Ok(lexicon)
    }

    /// Merge a YAML lexicon; later forms override earlier ones
    pub fn merge_yaml(&mut self, yaml: &str) -> Result<(), TextProcessingError> {
        let raw: LexiconYaml = serde_yaml::from_str(yaml)
            .map_err(|e| TextProcessingError::Lexicon(format!("YAML parse error: {}", e)))?;

        for group in raw.words {
            let lemma = group.lemma.to_lowercase();
            let entry = LexEntry {
                lemma: lemma.clone(),
                pos: group.pos,
            };

            if group.pos == PartOfSpeech::Verb {
                self.add_verb(&lemma);
            }

            let forms = if group.forms.is_empty() {
                vec![lemma.clone()]
            } else {
                group.forms
            };

            for form in forms {
                let form = form.to_lowercase();
                self.folded.insert(fold_accents(&form), entry.clone());
                self.forms.insert(form, entry.clone());
            }
        }

        for verb in raw.verbs {
            self.add_verb(&verb.to_lowercase());
        }

        Ok(())
    }

    fn add_verb(&mut self, infinitive: &str) {
        self.verbs
            .insert(fold_accents(infinitive), infinitive.to_string());
    }

    /// Exact lookup of a lower-cased form, then accent-folded lookup
    pub fn lookup(&self, form: &str) -> Option<&LexEntry> {
        self.forms
            .get(form)
            .or_else(|| self.folded.get(&fold_accents(form)))
    }

    /// Known infinitive for an accent-folded candidate
    pub fn infinitive(&self, folded_candidate: &str) -> Option<&str> {
        self.verbs.get(folded_candidate).map(String::as_str)
    }

    pub fn is_known_verb(&self, infinitive: &str) -> bool {
        self.verbs.contains_key(&fold_accents(infinitive))
    }

    pub fn form_count(&self) -> usize {
        self.forms.len()
    }

    pub fn verb_count(&self) -> usize {
        self.verbs.len()
    }

    /// Lemmas registered under a tag
    pub fn lemmas_with_pos(&self, pos: PartOfSpeech) -> HashSet<&str> {
        self.forms
            .values()
            .filter(|e| e.pos == pos)
            .map(|e| e.lemma.as_str())
            .collect()
    }
}

/// Strip acute accents and diaeresis, keep `ñ`
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            other => other,
        })
        .collect()
}
