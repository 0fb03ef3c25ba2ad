//! Pattern syntax
//!
//! A pattern is a sequence of elements, each consuming exactly one token:
//!
//! | element       | matches                                           |
//! |---------------|---------------------------------------------------|
//! | `reservar`    | a token with that lemma                           |
//! | `mesa/NOUN`   | that lemma, or failing that any `NOUN` token      |
//! | `<NUM\|PROPN>` | any token tagged with one of the listed tags      |
//! | `*`           | any single token                                  |

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use habla_core::PartOfSpeech;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("pattern has only wildcards")]
    OnlyWildcards,

    #[error("element {0} is empty")]
    EmptyElement(usize),

    #[error("element '{0}' contains whitespace")]
    Whitespace(String),

    #[error("element '{element}': unknown part-of-speech tag '{tag}'")]
    UnknownTag { element: String, tag: String },

    #[error("element '{0}' lists no tags")]
    EmptyTagSet(String),
}

/// One pattern element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternElement {
    ExactLemma {
        lemma: String,
        /// Fallback tag credited when the lemma differs
        pos: Option<PartOfSpeech>,
    },
    AnyOfPos(BTreeSet<PartOfSpeech>),
    Wildcard,
}

impl PatternElement {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

impl FromStr for PatternElement {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.chars().any(char::is_whitespace) {
            return Err(PatternError::Whitespace(s.to_string()));
        }

        if s == "*" {
            return Ok(Self::Wildcard);
        }

        if let Some(inner) = s.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            let tags = inner
                .split('|')
                .filter(|t| !t.is_empty())
                .map(|t| parse_tag(s, t))
                .collect::<Result<BTreeSet<_>, _>>()?;
            if tags.is_empty() {
                return Err(PatternError::EmptyTagSet(s.to_string()));
            }
            return Ok(Self::AnyOfPos(tags));
        }

        let (lemma, pos) = match s.rsplit_once('/') {
            Some((lemma, tag)) if !lemma.is_empty() => (lemma, Some(parse_tag(s, tag)?)),
            _ => (s, None),
        };

        Ok(Self::ExactLemma {
            lemma: lemma.to_lowercase(),
            pos,
        })
    }
}

fn parse_tag(element: &str, tag: &str) -> Result<PartOfSpeech, PatternError> {
    tag.parse().map_err(|_| PatternError::UnknownTag {
        element: element.to_string(),
        tag: tag.to_string(),
    })
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactLemma { lemma, pos: None } => f.write_str(lemma),
            Self::ExactLemma {
                lemma,
                pos: Some(pos),
            } => write!(f, "{}/{}", lemma, pos),
            Self::AnyOfPos(tags) => {
                let tags: Vec<&str> = tags.iter().map(PartOfSpeech::as_str).collect();
                write!(f, "<{}>", tags.join("|"))
            }
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// A validated pattern: non-empty, with at least one non-wildcard element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    elements: Vec<PatternElement>,
}

impl Pattern {
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self, PatternError> {
        if items.is_empty() {
            return Err(PatternError::Empty);
        }

        let elements = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item = item.as_ref();
                if item.trim().is_empty() {
                    Err(PatternError::EmptyElement(i))
                } else {
                    item.parse()
                }
            })
            .collect::<Result<Vec<PatternElement>, _>>()?;

        if elements.iter().all(PatternElement::is_wildcard) {
            return Err(PatternError::OnlyWildcards);
        }

        Ok(Self { elements })
    }

    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.elements.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}
