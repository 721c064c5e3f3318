//! Response cleanup: strip markdown fences and parse the LLM output as JSON.
//!
//! ## Why is cleanup necessary?
//!
//! Even when the prompt says "JSON only, no fences", chat models routinely
//! wrap their answer in ` ```json ... ``` `. The fence is structurally
//! invalid JSON but the payload inside is usually fine, so we strip the
//! first and last fenced lines before parsing rather than failing the whole
//! request over formatting.
//!
//! Stripping is idempotent: feeding already-clean text through
//! [`strip_code_fences`] returns it unchanged, so a well-behaved model costs
//! nothing.

use crate::output::StructuredResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Outer fence with an optional language tag on the opening line.
static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n(.*)\n```\s*$").unwrap());

/// Strip a wrapping triple-backtick fence, if present.
///
/// A response that does not begin with a fence is passed through unchanged
/// (modulo surrounding whitespace, which JSON parsing ignores anyway).
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCE.captures(trimmed) {
        caps[1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Clean the raw LLM response and parse it as JSON.
///
/// Never fails: an unparsable response degrades to
/// [`StructuredResult::Unparsed`] carrying the cleaned text.
pub fn parse_structured(response: &str) -> StructuredResult {
    let cleaned = strip_code_fences(response);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => StructuredResult::Parsed(value),
        Err(e) => {
            debug!("LLM response is not valid JSON after cleanup: {}", e);
            StructuredResult::Unparsed { raw: cleaned }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fence_with_language_tag() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn strips_fence_without_language_tag() {
        let input = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn passthrough_without_fence() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn stripping_is_idempotent_on_clean_input() {
        let clean = "{\"data\": {\"weight\": 80}}";
        assert_eq!(strip_code_fences(&strip_code_fences(clean)), clean);
    }

    #[test]
    fn multiline_payload_survives_stripping() {
        let input = "```json\n{\n  \"a\": 1,\n  \"b\": 2\n}\n```";
        let result = parse_structured(input);
        assert_eq!(
            result,
            StructuredResult::Parsed(json!({"a": 1, "b": 2}))
        );
    }

    #[test]
    fn parse_roundtrip_on_serialised_result() {
        // A parsed result serialised back to JSON and re-cleaned must parse
        // to an equal value.
        let original = StructuredResult::Parsed(json!({"data": {"bp": "120/80"}}));
        let serialised = serde_json::to_string(&original).unwrap();
        assert_eq!(parse_structured(&serialised), original);
    }

    #[test]
    fn invalid_json_degrades_never_raises() {
        let result = parse_structured("```\nThe patient seems fine.\n```");
        assert_eq!(
            result,
            StructuredResult::Unparsed {
                raw: "The patient seems fine.".into()
            }
        );
    }
}
