//! Object key sanitization
//!
//! Maps arbitrary text onto the character subset the image-processing
//! service handles without surprises.

/// Whether `c` survives [`sanitize`] unchanged.
pub fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '!' | '.' | '/')
}

/// Whitespace as matched by `\s` in JavaScript regular expressions.
///
/// Differs from [`char::is_whitespace`]: U+FEFF counts, U+0085 does not.
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{000B}' | '\u{000C}' | '\r' | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Collapse each whitespace run into a single `-`, then drop every character
/// outside `[A-Za-z0-9_\-!./]`.
pub fn sanitize(text: &str) -> String {
    let mut hyphenated = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for c in text.chars() {
        if is_js_whitespace(c) {
            if !in_whitespace {
                hyphenated.push('-');
            }
            in_whitespace = true;
        } else {
            hyphenated.push(c);
            in_whitespace = false;
        }
    }

    hyphenated.chars().filter(|&c| is_safe_char(c)).collect()
}

/// Distinct characters of `text` that [`sanitize`] would replace or drop, in
/// order of first appearance.
pub fn unsafe_chars(text: &str) -> Vec<char> {
    let mut found = Vec::new();
    for c in text.chars() {
        if !is_safe_char(c) && !found.contains(&c) {
            found.push(c);
        }
    }
    found
}
