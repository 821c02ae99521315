//! Display helpers for person names.

/// Title case: the first letter of every alphabetic run is upper-cased, the
/// rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// `"First Last"` in title case; a missing part leaves no stray space.
pub fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    let joined = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    title_case(joined.trim())
}
