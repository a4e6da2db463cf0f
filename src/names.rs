//! Name canonicalization.
//!
//! Two display names refer to the same person when their canonical forms are
//! equal. The canonical form is computed as:
//!
//! ```text
//! normalize(name) = fold_final_sigma(lowercase(strip_marks(NFD(name))))
//! ```
//!
//! Raw string or case-insensitive comparison is never enough: `Mário` and
//! `MARIO`, or `Παναγιώτης` and `Παναγιώτησ`, must compare equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Compute the canonical comparison form of a name.
///
/// # Example
///
/// ```rust
/// use reunion_board::names::normalize;
///
/// assert_eq!(normalize("Mário Müller"), "mario muller");
/// assert_eq!(normalize("Παναγιώτης"), "παναγιωτησ");
/// ```
pub fn normalize(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .replace('ς', "σ")
}

/// Whether two names are the same under [`normalize`].
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Replace every run of whitespace with a single dash.
///
/// Leading and trailing whitespace is dropped rather than turned into dashes.
pub fn dash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Form under which a first or last name is stored in the roster.
///
/// `"anna maria"` becomes `"ANNA-MARIA"`, `"Νίκος"` becomes `"ΝΙΚΟΣ"`.
pub fn storage_name(raw: &str) -> String {
    normalize(&dash_whitespace(raw)).to_uppercase()
}

/// Lower-case a word and spell its Greek letters with Latin ones.
///
/// Characters without a mapping pass through unchanged.
pub fn transliterate_greek(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.to_lowercase().chars() {
        let mapped = match c {
            'α' | 'ά' => "a",
            'β' => "b",
            'γ' => "g",
            'δ' => "d",
            'ε' | 'έ' => "e",
            'ζ' => "z",
            'η' | 'ή' | 'ι' | 'ί' => "i",
            'θ' => "th",
            'κ' => "k",
            'λ' => "l",
            'μ' => "m",
            'ν' => "n",
            'ξ' => "ks",
            'ο' | 'ό' | 'ω' | 'ώ' => "o",
            'π' => "p",
            'ρ' => "r",
            'σ' | 'ς' => "s",
            'τ' => "t",
            'υ' | 'ύ' => "u",
            'φ' => "ph",
            'χ' => "x",
            'ψ' => "ps",
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(mapped);
    }
    out
}

/// Keep only ASCII letters and digits.
pub fn keep_latin_only(word: &str) -> String {
    word.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ignores_case() {
        assert!(names_equal("John Doe", "john doe"));
    }

    #[test]
    fn test_different_names() {
        assert!(!names_equal("Alice Smith", "Bob Johnson"));
    }

    #[test]
    fn test_equal_ignores_diacritics() {
        assert!(names_equal("Mário Müller", "maRIO MuLLER"));
    }

    #[test]
    fn test_final_sigma_folds() {
        assert!(names_equal("Παναγιώτης", "Παναγιώτησ"));
        assert!(names_equal("ΝΙΚΟΣ", "Νίκος"));
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(normalize(""), "");
        assert!(names_equal("", ""));
    }

    #[test]
    fn test_dash_whitespace() {
        assert_eq!(dash_whitespace("Hello World"), "Hello-World");
        assert_eq!(dash_whitespace("Hello   World"), "Hello-World");
        assert_eq!(dash_whitespace("Hello\tWorld\nHow are you?"), "Hello-World-How-are-you?");
        assert_eq!(dash_whitespace("NoSpacesHere"), "NoSpacesHere");
        assert_eq!(dash_whitespace("  padded  "), "padded");
    }

    #[test]
    fn test_storage_name() {
        assert_eq!(storage_name("anna maria"), "ANNA-MARIA");
        assert_eq!(storage_name("doe"), "DOE");
        assert_eq!(storage_name("Νίκος"), "ΝΙΚΟΣ");
    }

    #[test]
    fn test_transliterate_greek() {
        assert_eq!(transliterate_greek("γειά σας"), "geia sas");
        assert_eq!(transliterate_greek("Καλημέρα"), "kalimera");
        assert_eq!(transliterate_greek("αγάπη"), "agapi");
        assert_eq!(transliterate_greek("1-2-98 ΛΟΚΑΤΖΗΔΕΣ"), "1-2-98 lokatzides");
        assert_eq!(transliterate_greek("Φιλοσοφία"), "philosophia");
        assert_eq!(transliterate_greek("Hello"), "hello");
        assert_eq!(transliterate_greek(""), "");
    }

    #[test]
    fn test_keep_latin_only() {
        assert_eq!(keep_latin_only("H3ll0, W0rld!"), "H3ll0W0rld");
        assert_eq!(keep_latin_only("Special@Characters!$"), "SpecialCharacters");
        assert_eq!(keep_latin_only("Γειά σας"), "");
        assert_eq!(keep_latin_only("1234567890"), "1234567890");
    }
}
