use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

const LINK_PATTERN: &str = r"https?://[A-Za-z0-9./?&=_-]+";

// Emoticons, pictographs, transport, alchemical, geometric shapes extended,
// supplemental arrows, supplemental symbols, chess, symbols extended-A, dingbats.
const EMOJI_PATTERN: &str = concat!(
    "[",
    r"\x{1F600}-\x{1F64F}",
    r"\x{1F300}-\x{1F5FF}",
    r"\x{1F680}-\x{1F6FF}",
    r"\x{1F700}-\x{1F77F}",
    r"\x{1F780}-\x{1F7FF}",
    r"\x{1F800}-\x{1F8FF}",
    r"\x{1F900}-\x{1F9FF}",
    r"\x{1FA00}-\x{1FA6F}",
    r"\x{1FA70}-\x{1FAFF}",
    r"\x{2702}-\x{27B0}",
    "]+"
);

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LINK_PATTERN).expect("valid link regex"));
static EMOJI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMOJI_PATTERN).expect("valid emoji regex"));

/// Every http(s) URL in `text`, in order of appearance. Repeats are kept.
pub fn extract_links(text: &str) -> Vec<String> {
    LINK_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Concatenation of every character of `text` that falls in the emoji ranges.
pub fn extract_emojis(text: &str) -> String {
    EMOJI_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

/// Removes links, then emoji, leaving everything else untouched.
pub fn clean_message(text: &str) -> String {
    let without_links = LINK_REGEX.replace_all(text, "");
    EMOJI_REGEX.replace_all(&without_links, "").into_owned()
}

/// Strips decorative characters so data-derived text is safe to write to
/// every log sink.
pub fn log_safe(text: &str) -> Cow<'_, str> {
    EMOJI_REGEX.replace_all(text, "")
}
