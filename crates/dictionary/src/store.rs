//! Dictionary store
//!
//! Holds the validated entries together with two inverted indexes, one keyed
//! by lemma and one by part of speech. Candidate lookup unions the postings of
//! every lemma and tag present in an utterance, so any entry that could score
//! against the utterance is returned.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use habla_config::{DictionarySource, IntentDefinition, SlotDefinition, SlotKind};
use habla_core::{PartOfSpeech, Utterance};

use crate::pattern::{Pattern, PatternElement};
use crate::{DictionaryError, Result};

/// A dictionary entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// Position in the dictionary source; lower wins ties
    pub order: usize,
    pub pattern: Pattern,
    /// Response templates
    pub responses: Vec<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Default)]
pub struct DictionaryStore {
    entries: Vec<Arc<DictionaryEntry>>,
    by_lemma: HashMap<String, Vec<usize>>,
    by_pos: HashMap<PartOfSpeech, Vec<usize>>,
    intents: HashMap<String, IntentDefinition>,
    slots: HashMap<String, SlotDefinition>,
}

impl DictionaryStore {
    /// Read and build from a YAML or JSON dictionary file
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = DictionarySource::load(path)?;
        Self::load(&source)
    }

    /// Validate a dictionary source and build the indexes
    ///
    /// When two entries share the same pattern, the later one replaces the
    /// earlier one.
    pub fn load(source: &DictionarySource) -> Result<Self> {
        let slots = validate_slots(&source.slots)?;
        let intents = validate_intents(&source.intents, &slots)?;

        let mut parsed = Vec::with_capacity(source.entries.len());
        for (i, definition) in source.entries.iter().enumerate() {
            let pattern = Pattern::parse(&definition.pattern)
                .map_err(|e| DictionaryError::InvalidPattern { entry: i, source: e })?;

            let collects_slots = match &definition.intent {
                Some(name) => {
                    let intent: &IntentDefinition =
                        intents
                            .get(name)
                            .ok_or_else(|| DictionaryError::UndefinedIntent {
                                entry: i,
                                intent: name.clone(),
                            })?;
                    intent.requires_slots()
                }
                None => false,
            };

            if definition.responses.is_empty() && !collects_slots {
                return Err(DictionaryError::NoResponses { entry: i });
            }

            parsed.push(DictionaryEntry {
                order: i,
                pattern,
                responses: definition.responses.clone(),
                intent: definition.intent.clone(),
            });
        }

        let mut last_by_pattern: HashMap<&Pattern, usize> = HashMap::new();
        for (i, entry) in parsed.iter().enumerate() {
            if let Some(previous) = last_by_pattern.insert(&entry.pattern, i) {
                let earlier = &parsed[previous];
                if earlier.intent != entry.intent {
                    tracing::warn!(
                        pattern = %entry.pattern,
                        replaced = previous,
                        by = i,
                        replaced_intent = ?earlier.intent,
                        intent = ?entry.intent,
                        "Duplicate pattern with a different intent, later entry wins"
                    );
                } else {
                    tracing::debug!(pattern = %entry.pattern, replaced = previous, by = i, "Duplicate pattern replaced");
                }
            }
        }
        let kept: BTreeSet<usize> = last_by_pattern.into_values().collect();

        let mut store = Self {
            intents,
            slots,
            ..Self::default()
        };
        for (i, entry) in parsed.into_iter().enumerate() {
            if kept.contains(&i) {
                store.insert(entry);
            }
        }

        tracing::info!(
            entries = store.entries.len(),
            intents = store.intents.len(),
            slots = store.slots.len(),
            lemma_keys = store.by_lemma.len(),
            "Dictionary loaded"
        );

        Ok(store)
    }

    fn insert(&mut self, entry: DictionaryEntry) {
        let idx = self.entries.len();
        for element in entry.pattern.elements() {
            match element {
                PatternElement::ExactLemma { lemma, pos } => {
                    push_posting(self.by_lemma.entry(lemma.clone()).or_default(), idx);
                    if let Some(pos) = pos {
                        push_posting(self.by_pos.entry(*pos).or_default(), idx);
                    }
                }
                PatternElement::AnyOfPos(tags) => {
                    for tag in tags {
                        push_posting(self.by_pos.entry(*tag).or_default(), idx);
                    }
                }
                PatternElement::Wildcard => {}
            }
        }
        self.entries.push(Arc::new(entry));
    }

    /// Entries that could match the utterance, in load order
    pub fn lookup_candidates(&self, utterance: &Utterance) -> Vec<Arc<DictionaryEntry>> {
        let mut hits = BTreeSet::new();
        for token in utterance.tokens() {
            if let Some(postings) = self.by_lemma.get(&token.lemma) {
                hits.extend(postings.iter().copied());
            }
            if let Some(postings) = self.by_pos.get(&token.pos) {
                hits.extend(postings.iter().copied());
            }
        }
        hits.into_iter()
            .map(|idx| Arc::clone(&self.entries[idx]))
            .collect()
    }

    /// All entries in load order
    pub fn entries(&self) -> &[Arc<DictionaryEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn intent(&self, name: &str) -> Option<&IntentDefinition> {
        self.intents.get(name)
    }

    pub fn slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.slots.get(name)
    }

    pub fn intents(&self) -> impl Iterator<Item = &IntentDefinition> {
        self.intents.values()
    }
}

/// Postings stay sorted because entries are inserted in load order
fn push_posting(postings: &mut Vec<usize>, idx: usize) {
    if postings.last() != Some(&idx) {
        postings.push(idx);
    }
}

fn validate_slots(slots: &[SlotDefinition]) -> Result<HashMap<String, SlotDefinition>> {
    let mut by_name = HashMap::with_capacity(slots.len());
    for slot in slots {
        if slot.prompt.trim().is_empty() {
            return Err(DictionaryError::MissingPrompt(slot.name.clone()));
        }
        if slot.kind == SlotKind::OneOf && slot.values.is_empty() {
            return Err(DictionaryError::MissingValues(slot.name.clone()));
        }
        if by_name.insert(slot.name.clone(), slot.clone()).is_some() {
            return Err(DictionaryError::DuplicateSlot(slot.name.clone()));
        }
    }
    Ok(by_name)
}

fn validate_intents(
    intents: &[IntentDefinition],
    slots: &HashMap<String, SlotDefinition>,
) -> Result<HashMap<String, IntentDefinition>> {
    let mut by_name = HashMap::with_capacity(intents.len());
    for intent in intents {
        if let Some(missing) = intent.required_slots.iter().find(|s| !slots.contains_key(*s)) {
            return Err(DictionaryError::UndefinedSlot {
                intent: intent.name.clone(),
                slot: missing.clone(),
            });
        }
        if intent.requires_slots() && intent.confirmation.is_none() {
            return Err(DictionaryError::MissingConfirmation(intent.name.clone()));
        }
        if by_name.insert(intent.name.clone(), intent.clone()).is_some() {
            return Err(DictionaryError::DuplicateIntent(intent.name.clone()));
        }
    }
    Ok(by_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use habla_core::Token;

    fn source(yaml: &str) -> DictionarySource {
        DictionarySource::from_yaml(yaml).unwrap()
    }

    fn utterance(tokens: &[(&str, PartOfSpeech)]) -> Utterance {
        Utterance::new(
            "",
            tokens
                .iter()
                .map(|(lemma, pos)| Token::new(*lemma, *lemma, *pos))
                .collect(),
        )
    }

    const BASIC: &str = r#"
entries:
  - pattern: ["hola"]
    responses: ["¡Hola!"]
  - pattern: ["<NUM>", "persona/NOUN"]
    responses: ["Mesa para {n}"]
  - pattern: ["querer", "*"]
    responses: ["¿Qué quieres?"]
"#;

    #[test]
    fn test_load_and_lookup() {
        let store = DictionaryStore::load(&source(BASIC)).unwrap();
        assert_eq!(store.len(), 3);

        let hola = store.lookup_candidates(&utterance(&[("hola", PartOfSpeech::Intj)]));
        assert_eq!(hola.len(), 1);
        assert_eq!(hola[0].order, 0);

        let by_tag = store.lookup_candidates(&utterance(&[("gente", PartOfSpeech::Noun)]));
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].order, 1);

        let none = store.lookup_candidates(&utterance(&[("zapato", PartOfSpeech::Adj)]));
        assert!(none.is_empty());
    }

    #[test]
    fn test_candidates_in_load_order_without_duplicates() {
        let store = DictionaryStore::load(&source(BASIC)).unwrap();
        let candidates = store.lookup_candidates(&utterance(&[
            ("querer", PartOfSpeech::Verb),
            ("4", PartOfSpeech::Num),
            ("hola", PartOfSpeech::Intj),
            ("4", PartOfSpeech::Num),
        ]));
        let orders: Vec<usize> = candidates.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_pattern_last_wins() {
        let yaml = r#"
entries:
  - pattern: ["hola"]
    responses: ["primero"]
  - pattern: ["adiós"]
    responses: ["chao"]
  - pattern: ["Hola"]
    responses: ["segundo"]
"#;
        let store = DictionaryStore::load(&source(yaml)).unwrap();
        assert_eq!(store.len(), 2);

        let hola = store.lookup_candidates(&utterance(&[("hola", PartOfSpeech::Intj)]));
        assert_eq!(hola.len(), 1);
        assert_eq!(hola[0].responses, vec!["segundo"]);
        assert_eq!(hola[0].order, 2);
    }

    #[test]
    fn test_entry_without_responses_needs_slot_intent() {
        let yaml = r#"
slots:
  - { name: fecha, kind: date, prompt: "¿Qué día?" }
intents:
  - { name: reservar, required_slots: [fecha], confirmation: "Hecho para {fecha}" }
entries:
  - pattern: ["reservar"]
    intent: reservar
"#;
        assert!(DictionaryStore::load(&source(yaml)).is_ok());

        let yaml = "entries:\n  - pattern: [\"hola\"]\n";
        assert_eq!(
            DictionaryStore::load(&source(yaml)).unwrap_err(),
            DictionaryError::NoResponses { entry: 0 }
        );
    }

    #[test]
    fn test_malformed_entries_fail() {
        let cases = [
            (
                "entries:\n  - { pattern: [], responses: [x] }\n",
                "invalid pattern",
            ),
            (
                "entries:\n  - { pattern: ['*'], responses: [x] }\n",
                "only wildcards",
            ),
            (
                "entries:\n  - { pattern: ['mesa/FOO'], responses: [x] }\n",
                "unknown part-of-speech",
            ),
            (
                "entries:\n  - { pattern: [hola], responses: [x], intent: nada }\n",
                "undefined intent",
            ),
            (
                "intents:\n  - { name: r, required_slots: [fecha], confirmation: ok }\n",
                "undefined slot",
            ),
            (
                "slots:\n  - { name: f, kind: date, prompt: '?' }\nintents:\n  - { name: r, required_slots: [f] }\n",
                "no confirmation",
            ),
            (
                "slots:\n  - { name: f, kind: date }\n",
                "no prompt",
            ),
            (
                "slots:\n  - { name: f, kind: one_of, prompt: '?' }\n",
                "lists no values",
            ),
        ];

        for (yaml, expected) in cases {
            let err = DictionaryStore::load(&source(yaml)).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{:?} should mention {:?}",
                err,
                expected
            );
            assert!(habla_core::Error::from(err).is_fatal());
        }
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, BASIC.as_bytes()).unwrap();
        let store = DictionaryStore::load_path(file.path()).unwrap();
        assert_eq!(store.len(), 3);

        assert!(matches!(
            DictionaryStore::load_path("missing.yaml"),
            Err(DictionaryError::Source(_))
        ));
    }
}
