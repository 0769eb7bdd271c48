//! Phone-number extraction from free text.

use std::sync::LazyLock;

use regex::Regex;

/// North American numbers: optional `+1`, area code optionally in
/// parentheses, separators of space, dot, or dash.
static NANP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[\s.-]?)?\(?\b([2-9]\d{2})\)?[\s.-]?([2-9]\d{2})[\s.-]?(\d{4})\b")
        .expect("valid regex")
});

/// Returns the first phone-number-shaped token in `text`, normalized to
/// `(AAA) BBB-CCCC`.
#[must_use]
pub fn extract_phone(text: &str) -> Option<String> {
    let caps = NANP_RE.captures(text)?;
    Some(format!("({}) {}-{}", &caps[1], &caps[2], &caps[3]))
}
