//! HTML-entity escaping for client-supplied free text.
//!
//! Every free-text field accepted from a client passes through
//! [`escape_html`] before being stored or echoed, so stored documents never
//! contain raw markup. Numeric fields are exempt; they go through the
//! range-validated types in [`crate::types::numeric`] instead.

/// Escape the characters that are significant in an HTML context.
///
/// Mirrors the escaping set of the common `validator.escape` helper:
/// `& < > " ' /` become their entity forms. Idempotent input is not
/// assumed; escaping an already-escaped string escapes the ampersands
/// again, so callers must escape exactly once, at the request boundary.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}
