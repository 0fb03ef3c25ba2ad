//! Spanish number words

/// Convert a single Spanish number word to its value
///
/// Accepts lower-cased words with or without accents. Compound forms written
/// as several words (`treinta y dos`) are handled by [`words_to_number`].
///
/// # Examples
/// ```
/// use habla_text_processing::spanish::word_to_number;
/// assert_eq!(word_to_number("cinco"), Some(5));
/// assert_eq!(word_to_number("veintidós"), Some(22));
/// assert_eq!(word_to_number("cien"), Some(100));
/// ```
pub fn word_to_number(word: &str) -> Option<u32> {
    let folded = super::fold_accents(word);
    match folded.as_str() {
        "cero" => Some(0),
        "un" | "uno" | "una" => Some(1),
        "dos" => Some(2),
        "tres" => Some(3),
        "cuatro" => Some(4),
        "cinco" => Some(5),
        "seis" => Some(6),
        "siete" => Some(7),
        "ocho" => Some(8),
        "nueve" => Some(9),
        "diez" => Some(10),
        "once" => Some(11),
        "doce" => Some(12),
        "trece" => Some(13),
        "catorce" => Some(14),
        "quince" => Some(15),
        "dieciseis" => Some(16),
        "diecisiete" => Some(17),
        "dieciocho" => Some(18),
        "diecinueve" => Some(19),
        "veinte" => Some(20),
        "veintiun" | "veintiuno" | "veintiuna" => Some(21),
        "veintidos" => Some(22),
        "veintitres" => Some(23),
        "veinticuatro" => Some(24),
        "veinticinco" => Some(25),
        "veintiseis" => Some(26),
        "veintisiete" => Some(27),
        "veintiocho" => Some(28),
        "veintinueve" => Some(29),

        // Tens
        "treinta" => Some(30),
        "cuarenta" => Some(40),
        "cincuenta" => Some(50),
        "sesenta" => Some(60),
        "setenta" => Some(70),
        "ochenta" => Some(80),
        "noventa" => Some(90),
        "cien" | "ciento" => Some(100),
        "mil" => Some(1000),

        _ => None,
    }
}

/// Value of a word sequence such as `treinta y dos` or `ciento veinte`
///
/// Reads from the start of `words` and stops at the first word that does not
/// continue the number. Returns the value and the number of words consumed.
pub fn words_to_number<S: AsRef<str>>(words: &[S]) -> Option<(u32, usize)> {
    let mut total = word_to_number(words.first()?.as_ref())?;
    let mut consumed = 1;

    while consumed < words.len() {
        let word = words[consumed].as_ref();
        if word == "y" && total >= 30 && total % 10 == 0 && total < 100 {
            match words.get(consumed + 1).and_then(|w| word_to_number(w.as_ref())) {
                Some(unit) if unit < 10 && unit > 0 => {
                    total += unit;
                    consumed += 2;
                }
                _ => break,
            }
        } else if let Some(next) = word_to_number(word) {
            if total == 100 && next < 100 {
                total += next;
                consumed += 1;
            } else {
                break;
            }
        } else {
            break;
        }
    }

    Some((total, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_numbers() {
        assert_eq!(word_to_number("uno"), Some(1));
        assert_eq!(word_to_number("una"), Some(1));
        assert_eq!(word_to_number("cinco"), Some(5));
        assert_eq!(word_to_number("doce"), Some(12));
    }

    #[test]
    fn test_accent_variants() {
        assert_eq!(word_to_number("dieciséis"), Some(16));
        assert_eq!(word_to_number("dieciseis"), Some(16));
        assert_eq!(word_to_number("veintitrés"), Some(23));
    }

    #[test]
    fn test_tens() {
        assert_eq!(word_to_number("treinta"), Some(30));
        assert_eq!(word_to_number("noventa"), Some(90));
        assert_eq!(word_to_number("ciento"), Some(100));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(word_to_number("mesa"), None);
        assert_eq!(word_to_number(""), None);
    }

    #[test]
    fn test_compound_words() {
        assert_eq!(words_to_number(&["treinta", "y", "dos", "personas"]), Some((32, 3)));
        assert_eq!(words_to_number(&["ciento", "veinte"]), Some((120, 2)));
        assert_eq!(words_to_number(&["cuatro", "y", "dos"]), Some((4, 1)));
        assert_eq!(words_to_number(&["treinta", "y"]), Some((30, 1)));
        assert_eq!(words_to_number::<&str>(&[]), None);
    }
}
