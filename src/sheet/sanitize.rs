use once_cell::sync::Lazy;
use regex::Regex;

/// Dingbats, private use, misc symbols, everything astral (emoji live there),
/// zero-width joiner, emoji variation selector and the directional isolates.
static INVISIBLE_OR_EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\x{2700}-\x{27BF}\x{E000}-\x{F8FF}\x{2600}-\x{26FF}\x{1F000}-\x{10FFFF}\x{200D}\x{FE0F}\x{2066}-\x{2069}]",
    )
    .expect("sanitizer character class should compile")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern should compile"));

/// Strip emoji / invisible marks from a scraped cell, collapse whitespace runs, trim.
pub fn clean_text(raw: &str) -> String {
    let stripped = INVISIBLE_OR_EMOJI.replace_all(raw, "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}
