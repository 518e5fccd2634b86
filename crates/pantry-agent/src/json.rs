//! Pulling a JSON object out of free-form model output.

/// The substring from the first `{` to the last `}` when both exist in that
/// order; otherwise the text with Markdown code fences removed.
pub(crate) fn extract_json_object(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string(),
    }
}
