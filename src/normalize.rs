use std::sync::OnceLock;

use regex::Regex;

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Maps a raw column label to snake_case: trimmed, apostrophes and punctuation
/// dropped, whitespace runs joined with `_`, lowercased.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().replace('\'', "");
    let word_only = non_word().replace_all(&trimmed, "");
    whitespace_run()
        .replace_all(&word_only, "_")
        .to_lowercase()
}
