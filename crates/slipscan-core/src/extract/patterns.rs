//! Regex building blocks shared by the bank strategies
//!
//! Account patterns run against lowercased text so "XXX" and "xxx" masks
//! read the same.

use std::sync::LazyLock;

use regex::Regex;

/// Thai honorifics; "นางสาว" must precede "นาง" in the alternation
pub const HONORIFIC: &str = r"(?:น\.ส\.|นางสาว|นาย|นาง)";

/// Masked account: 1-3 groups of masking x's with optional separators,
/// 3-4 visible digits, optional trailing check digit or mask
pub const MASKED_ACCOUNT: &str = r"(?:x{1,3}[\s\-]?){1,3}\d{3,4}(?:-?[\dx])?";

pub static MASKED_ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MASKED_ACCOUNT).expect("valid regex"));

/// "จำนวนเงิน" amount label. Grouped thousands are tried before plain digits
/// so "1500.00" is not cut to "150".
pub static AMOUNT_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"จำนวนเงิน\s*(\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?)")
        .expect("valid regex")
});

/// Honorific + given name + family name, as printed on both sides of a slip
pub static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}\s*\p{{Thai}}+\s[\p{{Thai}}\.]+", HONORIFIC)).expect("valid regex")
});

/// Trimmed capture group, `None` when the group is absent or blank
pub fn capture(re: &Regex, text: &str, group: usize) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The n-th (zero-based) whole match of `re` in `text`
pub fn nth_match(re: &Regex, text: &str, n: usize) -> Option<String> {
    re.find_iter(text)
        .nth(n)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text from the first `start` anchor up to the first `end` anchor
///
/// Runs to the end of the text when `end` is absent; empty when `start` is
/// absent or `end` comes first.
pub fn segment<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let Some(from) = text.find(start) else {
        return "";
    };
    let to = text.find(end).unwrap_or(text.len());
    text.get(from..to).unwrap_or("")
}
