//! Text normalization and casing predicates.

use unicode_normalization::char::is_combining_mark;

/// Punctuation kept by [`clean`] besides word characters and whitespace.
const KEPT_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '(', ')', '-'];

/// Normalize a raw text run.
///
/// Removes every character that is not a word character, whitespace or one
/// of `. , : ; ! ? ( ) -`, collapses whitespace runs to a single space and
/// trims both ends. Empty input yields an empty string. Word characters are
/// letters, numerics and `_`; combining marks are not word characters and
/// no normalization is applied, so a decomposed accent is dropped.
///
/// ```
/// use pdf_outline::text::clean;
///
/// assert_eq!(clean("  1.2 \u{2022} Scope\t(draft) "), "1.2 Scope (draft)");
/// ```
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let filtered: String = text.chars().filter(|&c| is_kept(c)).collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_kept(c: char) -> bool {
    is_word_char(c) || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c)
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_numeric() || is_letter(c)
}

/// General category L. `Alphabetic` also covers combining marks and the
/// enclosed letter symbols, which are excluded here.
fn is_letter(c: char) -> bool {
    c.is_alphabetic() && !is_combining_mark(c) && !is_enclosed_letter(c)
}

/// Circled, parenthesized and squared Latin letters (category So).
fn is_enclosed_letter(c: char) -> bool {
    matches!(
        c,
        '\u{24B6}'..='\u{24E9}'
            | '\u{1F130}'..='\u{1F149}'
            | '\u{1F150}'..='\u{1F169}'
            | '\u{1F170}'..='\u{1F189}'
    )
}

/// Whether every cased word starts uppercase and continues lowercase.
///
/// Uppercase letters may only follow uncased characters and lowercase
/// letters may only follow cased ones; at least one cased letter is
/// required.
pub fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;

    for c in text.chars() {
        if c.is_uppercase() || is_titlecase_char(c) {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }

    cased
}

/// All cased characters are uppercase and there is at least one.
pub fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() || is_titlecase_char(c) {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Digraph title-case letters such as `ǅ`, which are neither upper nor lower.
fn is_titlecase_char(c: char) -> bool {
    !c.is_uppercase() && !c.is_lowercase() && c.to_lowercase().next() != Some(c)
}
