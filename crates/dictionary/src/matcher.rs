//! Scored matching of utterances against dictionary entries
//!
//! Each pattern element consumes exactly one token of a contiguous window.
//! Credits per element:
//!
//! - lemma equal: `lemma_weight`
//! - lemma differs but the element's tag matches: `pos_weight`
//! - tag set contains the token's tag: `pos_weight`
//! - wildcard: `wildcard_weight`
//!
//! A window only counts if every element matches. An entry scores its best
//! window (leftmost on ties). Across entries the highest score wins, then the
//! longer pattern, then the earlier entry.

use std::cmp::Reverse;
use std::ops::Range;
use std::sync::Arc;

use habla_config::MatcherConfig;
use habla_core::{Token, Utterance};

use crate::pattern::PatternElement;
use crate::store::{DictionaryEntry, DictionaryStore};

/// Outcome of matching one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Winning entry, `None` when nothing reached the threshold
    pub entry: Option<Arc<DictionaryEntry>>,
    /// Score of the winner, or of the best rejected candidate
    pub score: u32,
    /// Token span covered by the winner (`0..0` without a winner)
    pub span: Range<usize>,
}

impl MatchResult {
    pub fn no_match(best_rejected: u32) -> Self {
        Self {
            entry: None,
            score: best_rejected,
            span: 0..0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.entry.is_some()
    }

    pub fn is_no_match(&self) -> bool {
        self.entry.is_none()
    }

    pub fn intent(&self) -> Option<&str> {
        self.entry.as_ref().and_then(|e| e.intent.as_deref())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Best entry for the utterance among the store's candidates
    ///
    /// Pure: the same utterance against the same store always yields the same
    /// result. An empty utterance never matches.
    pub fn find_best(&self, utterance: &Utterance, store: &DictionaryStore) -> MatchResult {
        if utterance.is_empty() {
            return MatchResult::no_match(0);
        }
        self.match_candidates(utterance, &store.lookup_candidates(utterance))
    }

    /// Best entry among `candidates`, in any order
    ///
    /// Ranked by score, then pattern length, then load order (earlier wins).
    pub fn match_candidates(
        &self,
        utterance: &Utterance,
        candidates: &[Arc<DictionaryEntry>],
    ) -> MatchResult {
        let best = candidates
            .iter()
            .filter_map(|entry| {
                self.score_entry(entry, utterance)
                    .map(|(score, span)| (Arc::clone(entry), score, span))
            })
            .max_by_key(|(entry, score, _)| (*score, entry.pattern.len(), Reverse(entry.order)));

        match best {
            Some((entry, score, span)) if score >= self.config.min_score => {
                tracing::debug!(
                    entry = entry.order,
                    pattern = %entry.pattern,
                    intent = ?entry.intent,
                    score,
                    ?span,
                    "Matched"
                );
                MatchResult {
                    entry: Some(entry),
                    score,
                    span,
                }
            }
            Some((entry, score, _)) => {
                tracing::debug!(
                    entry = entry.order,
                    score,
                    min_score = self.config.min_score,
                    "Best candidate below threshold"
                );
                MatchResult::no_match(score)
            }
            None => MatchResult::no_match(0),
        }
    }

    /// Best window score for one entry, `None` if no window matches
    pub fn score_entry(
        &self,
        entry: &DictionaryEntry,
        utterance: &Utterance,
    ) -> Option<(u32, Range<usize>)> {
        let elements = entry.pattern.elements();
        let tokens = utterance.tokens();
        if elements.is_empty() || elements.len() > tokens.len() {
            return None;
        }

        let mut best: Option<(u32, Range<usize>)> = None;
        for start in 0..=tokens.len() - elements.len() {
            let window = &tokens[start..start + elements.len()];
            let score = elements
                .iter()
                .zip(window)
                .try_fold(0u32, |acc, (element, token)| {
                    self.credit(element, token).map(|c| acc.saturating_add(c))
                });

            if let Some(score) = score {
                if best.as_ref().map_or(true, |(b, _)| score > *b) {
                    best = Some((score, start..start + elements.len()));
                }
            }
        }
        best
    }

    fn credit(&self, element: &PatternElement, token: &Token) -> Option<u32> {
        match element {
            PatternElement::ExactLemma { lemma, pos } => {
                if token.lemma == *lemma {
                    Some(self.config.lemma_weight)
                } else if *pos == Some(token.pos) {
                    Some(self.config.pos_weight)
                } else {
                    None
                }
            }
            PatternElement::AnyOfPos(tags) => {
                tags.contains(&token.pos).then_some(self.config.pos_weight)
            }
            PatternElement::Wildcard => Some(self.config.wildcard_weight),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habla_config::DictionarySource;
    use habla_core::PartOfSpeech;

    fn store(yaml: &str) -> DictionaryStore {
        DictionaryStore::load(&DictionarySource::from_yaml(yaml).unwrap()).unwrap()
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

    fn matcher(min_score: u32) -> Matcher {
        Matcher::new(MatcherConfig {
            lemma_weight: 10,
            pos_weight: 4,
            wildcard_weight: 1,
            min_score,
        })
    }

    #[test]
    fn test_credits() {
        let s = store(
            r#"
entries:
  - pattern: ["querer", "mesa/NOUN", "<NUM>", "*"]
    responses: ["x"]
"#,
        );
        let u = utterance(&[
            ("querer", PartOfSpeech::Verb),
            ("terraza", PartOfSpeech::Noun),
            ("4", PartOfSpeech::Num),
            ("ya", PartOfSpeech::Adv),
        ]);
        let result = matcher(10).find_best(&u, &s);
        assert!(result.is_match());
        assert_eq!(result.score, 10 + 4 + 4 + 1);
        assert_eq!(result.span, 0..4);
    }

    #[test]
    fn test_every_element_must_match() {
        let s = store("entries:\n  - { pattern: [querer, reservar], responses: [x] }\n");
        let u = utterance(&[("querer", PartOfSpeech::Verb), ("comer", PartOfSpeech::Verb)]);
        let result = matcher(1).find_best(&u, &s);
        assert!(result.is_no_match());
        assert_eq!(result.score, 0);
        assert_eq!(result.span, 0..0);
    }

    #[test]
    fn test_window_is_contiguous_and_leftmost() {
        let s = store("entries:\n  - { pattern: [hola], responses: [x] }\n");
        let u = utterance(&[
            ("oye", PartOfSpeech::Intj),
            ("hola", PartOfSpeech::Intj),
            ("hola", PartOfSpeech::Intj),
        ]);
        assert_eq!(matcher(10).find_best(&u, &s).span, 1..2);

        let s = store("entries:\n  - { pattern: [querer, reservar], responses: [x] }\n");
        let u = utterance(&[
            ("querer", PartOfSpeech::Verb),
            ("ya", PartOfSpeech::Adv),
            ("reservar", PartOfSpeech::Verb),
        ]);
        assert!(!matcher(1).find_best(&u, &s).is_match());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let s = store("entries:\n  - { pattern: [\"<NUM>\", \"*\"], responses: [x] }\n");
        let u = utterance(&[("4", PartOfSpeech::Num), ("ya", PartOfSpeech::Adv)]);

        let at = matcher(5).find_best(&u, &s);
        assert!(at.is_match());
        assert_eq!(at.score, 5);

        let above = matcher(6).find_best(&u, &s);
        assert!(!above.is_match());
        assert_eq!(above.score, 5);
        assert_eq!(above.span, 0..0);
    }

    #[test]
    fn test_tie_break_prefers_longer_then_earlier() {
        let s = store(
            r#"
entries:
  - pattern: ["hola", "*"]
    responses: ["first"]
  - pattern: ["hola"]
    responses: ["short"]
  - pattern: ["*", "hola"]
    responses: ["third"]
"#,
        );
        // "hola *" and "* hola" both score 11, longer than "hola" (10)
        let u = utterance(&[
            ("oye", PartOfSpeech::Intj),
            ("hola", PartOfSpeech::Intj),
            ("ya", PartOfSpeech::Adv),
        ]);
        let result = matcher(10).find_best(&u, &s);
        assert_eq!(result.entry.unwrap().responses, vec!["first"]);

        let s = store(
            r#"
entries:
  - pattern: ["<INTJ>", "<INTJ>", "<INTJ>"]
    responses: ["long"]
  - pattern: ["hola", "*"]
    responses: ["short"]
"#,
        );
        // 12 vs 11: score wins over length
        let u = utterance(&[("hola", PartOfSpeech::Intj), ("oye", PartOfSpeech::Intj), ("ay", PartOfSpeech::Intj)]);
        assert_eq!(matcher(10).find_best(&u, &s).entry.unwrap().responses, vec!["long"]);
    }

    #[test]
    fn test_equal_score_and_length_keeps_load_order() {
        let s = store(
            r#"
entries:
  - pattern: ["hola/INTJ"]
    responses: ["a"]
  - pattern: ["<INTJ|NOUN>", "*"]
    responses: ["b"]
  - pattern: ["buenas/INTJ"]
    responses: ["c"]
"#,
        );
        let u = utterance(&[("ey", PartOfSpeech::Intj)]);
        // both single-element entries credit the tag only
        let result = matcher(4).find_best(&u, &s);
        assert_eq!(result.entry.unwrap().responses, vec!["a"]);
    }

    #[test]
    fn test_tie_break_uses_load_order_not_candidate_order() {
        let s = store(
            r#"
entries:
  - pattern: ["hola/INTJ"]
    responses: ["first"]
  - pattern: ["adiós/INTJ"]
    responses: ["second"]
  - pattern: ["buenas/INTJ"]
    responses: ["third"]
"#,
        );
        let u = utterance(&[("ey", PartOfSpeech::Intj)]);
        let reversed: Vec<Arc<DictionaryEntry>> = s.entries().iter().rev().cloned().collect();
        assert_eq!(reversed[0].order, 2);

        let result = matcher(4).match_candidates(&u, &reversed);
        assert_eq!(result.entry.unwrap().order, 0);
        assert_eq!(result.score, 4);
    }

    #[test]
    fn test_match_candidates_ignores_non_matching_entries() {
        let s = store(
            "entries:\n  - { pattern: [querer, reservar], responses: [x] }\n  - { pattern: [hola], responses: [y] }\n",
        );
        let u = utterance(&[("hola", PartOfSpeech::Intj)]);
        let result = matcher(10).match_candidates(&u, s.entries());
        assert_eq!(result.entry.unwrap().responses, vec!["y"]);
        assert!(matcher(10).match_candidates(&u, &[]).is_no_match());
    }

    #[test]
    fn test_huge_weights_saturate() {
        let s = store("entries:\n  - { pattern: [querer, reservar], responses: [x] }\n");
        let u = utterance(&[("querer", PartOfSpeech::Verb), ("reservar", PartOfSpeech::Verb)]);
        let m = Matcher::new(MatcherConfig {
            lemma_weight: 3_000_000_000,
            pos_weight: 4,
            wildcard_weight: 1,
            min_score: 10,
        });
        let result = m.find_best(&u, &s);
        assert!(result.is_match());
        assert_eq!(result.score, u32::MAX);
    }

    #[test]
    fn test_idempotent() {
        let s = store(
            "entries:\n  - { pattern: [hola], responses: [x] }\n  - { pattern: [\"*\", adiós], responses: [y] }\n",
        );
        let u = utterance(&[("hola", PartOfSpeech::Intj), ("adiós", PartOfSpeech::Intj)]);
        let m = matcher(10);
        assert_eq!(m.find_best(&u, &s), m.find_best(&u, &s));
    }

    #[test]
    fn test_every_entry_matches_its_own_pattern() {
        let s = store(
            r#"
entries:
  - { pattern: ["hola"], responses: [x] }
  - { pattern: ["querer", "reservar"], responses: [x] }
  - { pattern: ["<NUM>", "persona/NOUN"], responses: [x] }
  - { pattern: ["*", "gracias", "*"], responses: [x] }
"#,
        );
        let m = matcher(1);
        for entry in s.entries() {
            let tokens: Vec<(&str, PartOfSpeech)> = entry
                .pattern
                .elements()
                .iter()
                .map(|e| match e {
                    PatternElement::ExactLemma { lemma, pos } => {
                        (lemma.as_str(), pos.unwrap_or(PartOfSpeech::X))
                    }
                    PatternElement::AnyOfPos(tags) => ("7", *tags.iter().next().unwrap()),
                    PatternElement::Wildcard => ("algo", PartOfSpeech::X),
                })
                .collect();
            let result = m.find_best(&utterance(&tokens), &s);
            assert!(result.is_match(), "{} did not match itself", entry.pattern);
            assert!(m.score_entry(entry, &utterance(&tokens)).is_some());
        }
    }

    #[test]
    fn test_empty_utterance() {
        let s = store("entries:\n  - { pattern: [hola], responses: [x] }\n");
        assert!(!matcher(1).find_best(&Utterance::new("", vec![]), &s).is_match());
    }
}
