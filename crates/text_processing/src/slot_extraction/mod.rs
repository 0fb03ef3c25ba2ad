//! Slot value extraction
//!
//! Rule-based extraction of slot values from a normalized utterance. Lemma
//! rules work on the token sequence; numeric formats (`15/03`, `18:30`) are
//! read from the raw text because the segmenter splits them.
//!
//! Values come back as canonical strings:
//!
//! | kind     | examples                                         |
//! |----------|--------------------------------------------------|
//! | `date`   | `lunes`, `mañana`, `pasado mañana`, `15 de marzo`, `15/03/2025` |
//! | `time`   | `18:30`, `5:00`, `5:30`                          |
//! | `number` | `4`, `32`                                        |
//! | `one_of` | the matched value as listed in the slot          |
//! | `text`   | content words as typed, lower-cased              |

use once_cell::sync::Lazy;
use regex::Regex;

use habla_config::{SlotDefinition, SlotKind};
use habla_core::{PartOfSpeech, Utterance};

use crate::spanish::fold_accents;
use crate::spanish::numbers::{word_to_number, words_to_number};

// =============================================================================
// STATIC REGEX PATTERNS
// =============================================================================

/// dd/mm or dd/mm/yyyy (also with `-`)
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{4}|\d{2}))?\b").unwrap()
});

/// hh:mm or hhhmm, 24-hour clock. A dot is a decimal point, not a separator.
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3])[:h]([0-5]\d)\b").unwrap());

const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Extracts slot values by slot kind
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotExtractor;

impl SlotExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Value for `slot` found in the utterance, if any
    pub fn extract(&self, slot: &SlotDefinition, utterance: &Utterance) -> Option<String> {
        let value = match slot.kind {
            SlotKind::Date => self.extract_date(utterance),
            SlotKind::Time => self.extract_time(utterance),
            SlotKind::Number => self.extract_number(utterance).map(|n| n.to_string()),
            SlotKind::OneOf => self.extract_one_of(utterance, &slot.values),
            SlotKind::Text => self.extract_text(utterance),
        };

        if let Some(ref value) = value {
            tracing::debug!(slot = %slot.name, kind = ?slot.kind, value = %value, "Extracted slot");
        }
        value
    }

    /// Date expression
    pub fn extract_date(&self, utterance: &Utterance) -> Option<String> {
        if let Some(date) = numeric_date(utterance.raw()) {
            return Some(date);
        }

        let lemmas = utterance.lemmas();

        // <n> de <mes>
        for (i, lemma) in lemmas.iter().enumerate() {
            if i < 2 || !MONTHS.contains(lemma) || lemmas[i - 1] != "de" {
                continue;
            }
            if let Some(day) = token_number(utterance, i - 2).filter(|d| (1..=31).contains(d)) {
                return Some(format!("{} de {}", day, lemma));
            }
        }

        if lemmas.windows(2).any(|w| w == ["pasado", "mañana"]) {
            return Some("pasado mañana".to_string());
        }

        if let Some(day) = lemmas.iter().find(|l| WEEKDAYS.contains(*l)) {
            return Some(day.to_string());
        }

        lemmas
            .iter()
            .find(|l| matches!(**l, "hoy" | "mañana"))
            .map(|l| l.to_string())
    }

    /// Clock time as `h:mm`
    pub fn extract_time(&self, utterance: &Utterance) -> Option<String> {
        if let Some(caps) = CLOCK_TIME.captures(utterance.raw()) {
            let hour: u32 = caps[1].parse().ok()?;
            return Some(format!("{}:{}", hour, &caps[2]));
        }

        // a la una / a las <n> [y media | y cuarto | en punto]
        let tokens = utterance.tokens();
        for i in 0..tokens.len().saturating_sub(2) {
            if tokens[i].lemma != "a" || tokens[i + 1].lemma != "el" {
                continue;
            }
            let Some(hour) = token_number(utterance, i + 2).filter(|h| (0..=24).contains(h))
            else {
                continue;
            };

            let rest: Vec<&str> = tokens[i + 3..].iter().map(|t| t.lemma.as_str()).collect();
            let minutes = match rest.as_slice() {
                ["y", "medio" | "media", ..] => 30,
                ["y", "cuarto", ..] => 15,
                ["menos", "cuarto", ..] => return Some(format!("{}:45", hour.saturating_sub(1))),
                _ => 0,
            };
            return Some(format!("{}:{:02}", hour, minutes));
        }

        None
    }

    /// First quantity, written in digits or in words
    ///
    /// Articles (`un`, `una`), the hour of `a las <n>`, the day of
    /// `<n> de <mes>` and the parts of clock times and numeric dates are not
    /// quantities.
    pub fn extract_number(&self, utterance: &Utterance) -> Option<u32> {
        let tokens = utterance.tokens();
        let lemma_at = |i: usize| tokens.get(i).map(|t| t.lemma.as_str());
        let mut reserved = reserved_numerals(utterance.raw());

        (0..tokens.len()).find_map(|i| {
            let token = &tokens[i];
            if token.pos == PartOfSpeech::Det {
                return None;
            }
            if let Some(pos) = reserved.iter().position(|r| *r == token.surface) {
                reserved.swap_remove(pos);
                return None;
            }
            if i >= 2 && lemma_at(i - 2) == Some("a") && lemma_at(i - 1) == Some("el") {
                return None;
            }
            if lemma_at(i + 1) == Some("de")
                && lemma_at(i + 2).is_some_and(|l| MONTHS.contains(&l))
            {
                return None;
            }
            token_number(utterance, i)
        })
    }

    /// First token whose lemma or surface is one of `values`
    pub fn extract_one_of(&self, utterance: &Utterance, values: &[String]) -> Option<String> {
        utterance.tokens().iter().find_map(|token| {
            values
                .iter()
                .find(|v| {
                    let v = fold_accents(&v.to_lowercase());
                    v == fold_accents(&token.lemma) || v == fold_accents(&token.surface)
                })
                .cloned()
        })
    }

    /// Content words after leading function words
    pub fn extract_text(&self, utterance: &Utterance) -> Option<String> {
        let start = utterance
            .tokens()
            .iter()
            .position(|t| !t.pos.is_function_word())?;
        let text = utterance.surface_text(start..utterance.len());
        (!text.is_empty()).then_some(text)
    }
}

fn numeric_date(raw: &str) -> Option<String> {
    for caps in NUMERIC_DATE.captures_iter(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            continue;
        }
        return Some(match caps.get(3) {
            Some(year) => format!("{:02}/{:02}/{}", day, month, year.as_str()),
            None => format!("{:02}/{:02}", day, month),
        });
    }
    None
}

/// Digit groups that belong to clock times or numeric dates in `raw`
fn reserved_numerals(raw: &str) -> Vec<String> {
    CLOCK_TIME
        .captures_iter(raw)
        .chain(NUMERIC_DATE.captures_iter(raw))
        .flat_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Number starting at token `index`, in digits or Spanish words
fn token_number(utterance: &Utterance, index: usize) -> Option<u32> {
    let tokens = utterance.tokens();
    let token = tokens.get(index)?;

    if token.pos == PartOfSpeech::Num {
        if let Ok(n) = token.lemma.parse::<u32>() {
            return Some(n);
        }
    }

    if word_to_number(&token.surface).is_none() {
        return None;
    }
    let surfaces: Vec<&str> = tokens[index..].iter().map(|t| t.surface.as_str()).collect();
    words_to_number(&surfaces).map(|(n, _)| n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Normalizer, SpanishAnalyzer};
    use std::sync::Arc;

    fn utterance(text: &str) -> Utterance {
        Normalizer::new(Arc::new(SpanishAnalyzer::new().unwrap()), 2000)
            .normalize(text)
            .unwrap()
    }

    fn slot(kind: SlotKind, values: &[&str]) -> SlotDefinition {
        SlotDefinition {
            name: "s".to_string(),
            kind,
            prompt: "¿?".to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_weekday() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_date(&utterance("el lunes")).as_deref(), Some("lunes"));
        assert_eq!(
            extractor.extract_date(&utterance("El próximo Sábado")).as_deref(),
            Some("sábado")
        );
    }

    #[test]
    fn test_relative_days() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_date(&utterance("hoy")).as_deref(), Some("hoy"));
        assert_eq!(
            extractor.extract_date(&utterance("Pasado mañana, por favor")).as_deref(),
            Some("pasado mañana")
        );
        assert_eq!(
            extractor.extract_date(&utterance("para mañana")).as_deref(),
            Some("mañana")
        );
    }

    #[test]
    fn test_calendar_dates() {
        let extractor = SlotExtractor::new();
        assert_eq!(
            extractor.extract_date(&utterance("el 15 de marzo")).as_deref(),
            Some("15 de marzo")
        );
        assert_eq!(
            extractor.extract_date(&utterance("el cinco de mayo")).as_deref(),
            Some("5 de mayo")
        );
        assert_eq!(
            extractor.extract_date(&utterance("para el 5/3/2025")).as_deref(),
            Some("05/03/2025")
        );
        assert_eq!(extractor.extract_date(&utterance("el 40/13")), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(SlotExtractor::new().extract_date(&utterance("no sé")), None);
    }

    #[test]
    fn test_times() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_time(&utterance("a las 18:30")).as_deref(), Some("18:30"));
        assert_eq!(extractor.extract_time(&utterance("a las 5")).as_deref(), Some("5:00"));
        assert_eq!(
            extractor.extract_time(&utterance("a las nueve y media")).as_deref(),
            Some("9:30")
        );
        assert_eq!(extractor.extract_time(&utterance("a la una")).as_deref(), Some("1:00"));
        assert_eq!(extractor.extract_time(&utterance("por la tarde")), None);
    }

    #[test]
    fn test_numbers() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_number(&utterance("somos 4")), Some(4));
        assert_eq!(extractor.extract_number(&utterance("seremos treinta y dos")), Some(32));
        assert_eq!(extractor.extract_number(&utterance("ninguno")), None);
    }

    #[test]
    fn test_numbers_skip_articles_times_and_dates() {
        let extractor = SlotExtractor::new();
        assert_eq!(
            extractor.extract_number(&utterance("Quiero reservar una mesa para el lunes a las 9")),
            None
        );
        assert_eq!(extractor.extract_number(&utterance("el lunes a las 9")), None);
        assert_eq!(extractor.extract_number(&utterance("a las 21:30 somos 6")), Some(6));
        assert_eq!(extractor.extract_number(&utterance("a las 9:00 somos 9")), Some(9));
        assert_eq!(extractor.extract_number(&utterance("el 15/03 seremos 2")), Some(2));
        assert_eq!(extractor.extract_number(&utterance("el 15 de marzo, 8 personas")), Some(8));
        assert_eq!(extractor.extract_number(&utterance("a la una y somos uno")), Some(1));
    }

    #[test]
    fn test_decimals_are_not_times_or_dates() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_time(&utterance("cuesta 1.50 euros")), None);
        assert_eq!(extractor.extract_date(&utterance("sube un 5.3 por ciento")), None);
        assert_eq!(extractor.extract_time(&utterance("a las 18h30")).as_deref(), Some("18:30"));
    }

    #[test]
    fn test_one_of() {
        let extractor = SlotExtractor::new();
        let terraza = slot(SlotKind::OneOf, &["dentro", "terraza"]);
        assert_eq!(
            extractor.extract(&terraza, &utterance("En la terraza")).as_deref(),
            Some("terraza")
        );
        assert_eq!(extractor.extract(&terraza, &utterance("me da igual")), None);
    }

    #[test]
    fn test_text() {
        let extractor = SlotExtractor::new();
        let nombre = slot(SlotKind::Text, &[]);
        assert_eq!(
            extractor.extract(&nombre, &utterance("de Ana García")).as_deref(),
            Some("ana garcía")
        );
        assert_eq!(extractor.extract(&nombre, &utterance("de la")), None);
    }

    #[test]
    fn test_dispatch_by_kind() {
        let extractor = SlotExtractor::new();
        let u = utterance("el viernes a las 9 somos 3");
        assert_eq!(extractor.extract(&slot(SlotKind::Date, &[]), &u).as_deref(), Some("viernes"));
        assert_eq!(extractor.extract(&slot(SlotKind::Time, &[]), &u).as_deref(), Some("9:00"));
        assert_eq!(extractor.extract(&slot(SlotKind::Number, &[]), &u).as_deref(), Some("3"));
    }
}
