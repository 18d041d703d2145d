//! Symptom name canonicalization.

use std::sync::OnceLock;

use regex::Regex;

static SEPARATORS: OnceLock<Option<Regex>> = OnceLock::new();

/// Canonical form of a symptom name: trimmed, lower-cased, with runs of
/// whitespace, hyphens or underscores collapsed to a single `_`.
#[must_use]
pub fn normalize_symptom(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match SEPARATORS.get_or_init(|| Regex::new(r"[\s\-_]+").ok()) {
        Some(re) => re.replace_all(&lowered, "_").into_owned(),
        None => lowered.split_whitespace().collect::<Vec<_>>().join("_"),
    }
}
