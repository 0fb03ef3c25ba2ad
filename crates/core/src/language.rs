//! Linguistic types: tokens, part-of-speech tags and normalized utterances

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse part-of-speech tags (universal tag set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    /// Adjective
    Adj,
    /// Adposition (preposition)
    Adp,
    /// Adverb
    Adv,
    /// Auxiliary verb
    Aux,
    /// Coordinating conjunction
    Cconj,
    /// Determiner
    Det,
    /// Interjection
    Intj,
    /// Noun
    Noun,
    /// Numeral
    Num,
    /// Particle
    Part,
    /// Pronoun
    Pron,
    /// Proper noun
    Propn,
    /// Punctuation
    Punct,
    /// Subordinating conjunction
    Sconj,
    /// Symbol
    Sym,
    /// Verb
    Verb,
    /// Other
    X,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 17] = [
        Self::Adj,
        Self::Adp,
        Self::Adv,
        Self::Aux,
        Self::Cconj,
        Self::Det,
        Self::Intj,
        Self::Noun,
        Self::Num,
        Self::Part,
        Self::Pron,
        Self::Propn,
        Self::Punct,
        Self::Sconj,
        Self::Sym,
        Self::Verb,
        Self::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::X => "X",
        }
    }

    /// Tokens that carry no linguistic content and are dropped by normalization
    pub fn is_punctuation(&self) -> bool {
        matches!(self, Self::Punct)
    }

    /// Function words: determiners, adpositions, conjunctions and particles
    pub fn is_function_word(&self) -> bool {
        matches!(
            self,
            Self::Det | Self::Adp | Self::Cconj | Self::Sconj | Self::Part
        )
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPartOfSpeech(pub String);

impl fmt::Display for UnknownPartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown part-of-speech tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownPartOfSpeech {}

impl FromStr for PartOfSpeech {
    type Err = UnknownPartOfSpeech;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|pos| pos.as_str() == upper)
            .ok_or_else(|| UnknownPartOfSpeech(s.to_string()))
    }
}

/// A single analyzed token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as written (lower-cased after normalization)
    pub surface: String,
    /// Dictionary form
    pub lemma: String,
    /// Coarse part of speech
    pub pos: PartOfSpeech,
}

impl Token {
    pub fn new(surface: impl Into<String>, lemma: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.into(),
            lemma: lemma.into(),
            pos,
        }
    }
}

/// A normalized user utterance
///
/// Immutable once built: the normalizer is the only producer, and consumers
/// only read the token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    raw: String,
    tokens: Vec<Token>,
}

impl Utterance {
    pub fn new(raw: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            raw: raw.into(),
            tokens,
        }
    }

    /// Text as received
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized tokens in original order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lemma sequence
    pub fn lemmas(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.lemma.as_str()).collect()
    }

    pub fn contains_lemma(&self, lemma: &str) -> bool {
        self.tokens.iter().any(|t| t.lemma == lemma)
    }

    /// Surface forms of a token range joined by single spaces
    pub fn surface_text(&self, range: std::ops::Range<usize>) -> String {
        self.tokens
            .get(range)
            .unwrap_or_default()
            .iter()
            .map(|t| t.surface.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
