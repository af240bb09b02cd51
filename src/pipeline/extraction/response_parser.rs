use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// A reply wrapped in a fenced code block, optionally tagged `json`.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n?(.*?)\s*```$").unwrap()
});

/// Parse a model's reply into list items.
///
/// 1. Strip a wrapping fenced-code marker and surrounding whitespace.
/// 2. Decode as a JSON array of strings; returned verbatim on success.
/// 3. Otherwise treat it as plain text: one trimmed, non-empty line per item.
pub fn parse_item_list(raw: &str) -> Vec<String> {
    let stripped = strip_code_fence(raw);

    match serde_json::from_str::<Vec<String>>(stripped) {
        Ok(items) => items,
        Err(e) => {
            debug!(error = %e, "Reply is not a JSON string array, using plain-text lines");
            plain_text_lines(stripped)
        }
    }
}

/// Remove a leading/trailing triple-backtick fence (with optional `json` tag).
/// Text without a fence is only trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(inner) = FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }

    // Unterminated fence: the model stopped before closing it.
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        return rest.trim();
    }

    trimmed
}

fn plain_text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
