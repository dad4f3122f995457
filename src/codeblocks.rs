//! Extraction of fenced code regions from model output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::chat::CodeBlock;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(\w+)?\n(.*?)```").unwrap()
});

/// One CodeBlock per fenced region, in document order. A fence without a
/// language tag is reported as "text"; surrounding whitespace inside the
/// fence is trimmed.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    FENCE_RE.captures_iter(text)
        .map(|cap| CodeBlock {
            language: cap
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "text".to_string()),
            code: cap[2].trim().to_string(),
        })
        .collect()
}
