//! Markdown-fence stripping for model completions.
//!
//! Grammar: after trimming, a completion that starts with "```" keeps only the
//! text between the first pair of fences; a leading `json` tag on that text is
//! dropped and the result trimmed again. Anything else is returned trimmed.
//! Multiple fenced blocks, mid-string fences and other language tags get no
//! special recovery.

const FENCE: &str = "```";
const JSON_TAG: &str = "json";

/// Return text suitable for structured parsing. Never fails; malformed input
/// is passed through and surfaces later as a parse error.
pub fn normalize(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    let inner = match after_open.find(FENCE) {
        Some(end) => &after_open[..end],
        None => after_open,
    };
    let inner = inner.strip_prefix(JSON_TAG).unwrap_or(inner);
    inner.trim()
}

/// Normalize then parse as JSON.
pub fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(normalize(raw))
}
