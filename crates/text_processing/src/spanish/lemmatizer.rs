//! Suffix rules for words the lexicon does not list
//!
//! Every rule works on the lower-cased, accent-folded form. Verb rules only
//! fire when the candidate infinitive is a known verb, so an unknown noun is
//! never turned into an invented infinitive.

use once_cell::sync::Lazy;

use super::lexicon::{fold_accents, Lexicon};

/// Regular inflection endings, tried longest first against stem + ar/er/ir
static VERB_SUFFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut suffixes = vec![
        // Conditional and future
        "ariamos", "eriamos", "iriamos", "ariais", "arian", "erian", "irian", "arias", "erias",
        "irias", "aria", "eria", "iria", "aremos", "eremos", "iremos", "aran", "eran", "iran",
        "aras", "eras", "iras", "are", "ere", "ire", "ara", "era", "ira",
        // Imperfect
        "abamos", "abais", "aban", "abas", "aba", "iamos", "iais", "ian", "ias", "ia",
        // Preterite
        "asteis", "isteis", "aste", "iste", "aron", "ieron", "io",
        // Subjunctive
        "aramos", "ieramos", "iera", "ieras", "ieran", "emos",
        // Present
        "amos", "imos", "ais", "eis", "is", "an", "en", "as", "es", "a", "e", "o", "i",
        // Gerund and participle
        "ando", "iendo", "yendo", "ados", "adas", "ado", "ada", "idos", "idas", "ido", "ida",
    ];
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    suffixes.dedup();
    suffixes
});

/// Object pronouns attached to infinitives and gerunds
const ENCLITICS: [&str; 10] = ["los", "las", "les", "nos", "lo", "la", "le", "me", "te", "se"];

const INFINITIVE_ENDINGS: [&str; 3] = ["ar", "er", "ir"];

const MIN_STEM_CHARS: usize = 2;

/// Infinitive of an inflected form of a known verb
pub fn lemmatize_verb(lexicon: &Lexicon, word: &str) -> Option<String> {
    let folded = fold_accents(word);

    if let Some(infinitive) = lexicon.infinitive(&folded) {
        return Some(infinitive.to_string());
    }

    if let Some(infinitive) = strip_enclitics(lexicon, &folded) {
        return Some(infinitive);
    }

    inflection_to_infinitive(lexicon, &folded)
}

fn inflection_to_infinitive(lexicon: &Lexicon, folded: &str) -> Option<String> {
    for suffix in VERB_SUFFIXES.iter() {
        let Some(stem) = folded.strip_suffix(suffix) else {
            continue;
        };
        if stem.chars().count() < MIN_STEM_CHARS {
            continue;
        }
        for ending in INFINITIVE_ENDINGS {
            let candidate = format!("{}{}", stem, ending);
            if let Some(infinitive) = lexicon.infinitive(&candidate) {
                return Some(infinitive.to_string());
            }
        }
    }
    None
}

/// `reservarla`, `dándomelo`: up to two clitics on an infinitive or gerund
fn strip_enclitics(lexicon: &Lexicon, folded: &str) -> Option<String> {
    let mut rest = folded;
    for _ in 0..2 {
        let Some(stripped) = ENCLITICS.iter().find_map(|c| rest.strip_suffix(c)) else {
            break;
        };
        rest = stripped;

        if let Some(infinitive) = lexicon.infinitive(rest) {
            return Some(infinitive.to_string());
        }
        if rest.ends_with("ando") || rest.ends_with("iendo") {
            if let Some(infinitive) = inflection_to_infinitive(lexicon, rest) {
                return Some(infinitive);
            }
        }
    }
    None
}

/// Shape of an infinitive: `-ar`, `-er`, `-ir` with at least a short stem
pub fn looks_like_infinitive(word: &str) -> bool {
    word.chars().count() >= 4 && INFINITIVE_ENDINGS.iter().any(|e| word.ends_with(e))
}

/// Singular form of a plural noun or adjective, or `None` if not plural-shaped
pub fn singularize(word: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    if n < 4 || chars[n - 1] != 's' {
        return None;
    }

    // veces -> vez
    if let Some(stem) = word.strip_suffix("ces") {
        return Some(format!("{}z", stem));
    }

    // ciudades -> ciudad, flores -> flor
    if chars[n - 2] == 'e' && n >= 5 {
        let before = chars[n - 3];
        let before_that = chars[n - 4];
        if matches!(before, 'd' | 'l' | 'n' | 'r' | 'y' | 'j') && is_vowel(before_that) {
            return Some(chars[..n - 2].iter().collect());
        }
    }

    // casas -> casa, amables -> amable
    if is_vowel(chars[n - 2]) {
        return Some(chars[..n - 1].iter().collect());
    }

    None
}

/// Derivational endings that mark adjectives
pub fn has_adjective_suffix(word: &str) -> bool {
    const SUFFIXES: [&str; 5] = ["oso", "osa", "ble", "ivo", "iva"];
    word.chars().count() > 4 && SUFFIXES.iter().any(|s| word.ends_with(s))
}

/// `-mente` adverbs
pub fn has_adverb_suffix(word: &str) -> bool {
    word.chars().count() > 6 && word.ends_with("mente")
}

fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú'
    )
}
