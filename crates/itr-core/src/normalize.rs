//! String canonicalization shared by the ledger and document sides.
//!
//! Matching only ever compares canonicalized strings, so both sides must
//! run through exactly the same functions. Everything here is pure and
//! total; empty input yields empty output.

/// Canonicalize a spreadsheet header: uppercase, ASCII letters and digits
/// only.
///
/// `"Model No."` and `"MODEL NO"` both normalize to `"MODELNO"`.
pub fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Canonicalize a match key: trim and uppercase. Internal whitespace is
/// preserved; see [`normalize_key_collapsed`] for the collapsing variant.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Like [`normalize_key`], but runs of internal whitespace collapse to a
/// single space.
pub fn normalize_key_collapsed(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        for upper in c.to_uppercase() {
            out.push(upper);
        }
    }
    out
}
