//! Helpers for pulling a JSON object out of free-form model replies.
//!
//! Models regularly wrap JSON in markdown code fences or append commentary
//! after the closing brace, so plain `serde_json::from_str` on the raw reply
//! is not reliable.

use crate::error::{AppError, Result};

/// Extract the first complete JSON object from text and deserialize it.
pub fn parse_model_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    let json_text = extract_first_json_object(text).ok_or_else(|| {
        AppError::MalformedModelOutput(format!(
            "No JSON object found in response: {}",
            text.chars().take(500).collect::<String>()
        ))
    })?;

    serde_json::from_str(&json_text).map_err(|e| {
        AppError::MalformedModelOutput(format!("Failed to parse model JSON: {} | {}", e, json_text))
    })
}

/// Extract the first complete JSON object from text.
/// Handles markdown code fences and trailing commentary.
pub fn extract_first_json_object(text: &str) -> Option<String> {
    let text = text.trim();

    // First, try to find JSON within code fences
    if let Some(start) = text.find("```json") {
        let after_fence = &text[start + 7..];
        if let Some(end) = after_fence.find("```") {
            let json_content = after_fence[..end].trim();
            if let Some(obj) = find_json_object(json_content) {
                return Some(obj);
            }
        }
    }

    // Also check for plain ``` fences
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        // Skip any language identifier on the same line
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let after_lang = &after_fence[content_start..];
        if let Some(end) = after_lang.find("```") {
            let json_content = after_lang[..end].trim();
            if let Some(obj) = find_json_object(json_content) {
                return Some(obj);
            }
        }
    }

    // No code fences, try to find raw JSON object
    find_json_object(text)
}

/// Find the first complete JSON object in text by matching braces.
fn find_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let chars: Vec<char> = text[start..].chars().collect();

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(chars[..=i].iter().collect());
                }
            }
            _ => {}
        }
    }

    None
}
