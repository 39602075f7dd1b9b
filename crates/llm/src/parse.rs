use once_cell::sync::Lazy;
use regex::Regex;
use sarathi_core::NONE_LABEL;
use serde_json::Value;

use crate::{ClassifierVerdict, CollaboratorError};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

/// Drops a Markdown code fence around model output, if present.
fn strip_code_fence(content: &str) -> &str {
    CODE_FENCE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
        .unwrap_or(content)
        .trim()
}

/// Reads `{"match": ..., "correctedNative": ...}` from classifier output.
/// A missing or non-string `match` becomes `NONE`; a blank correction is
/// treated as absent.
pub fn parse_classifier_output(content: &str) -> Result<ClassifierVerdict, CollaboratorError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(CollaboratorError::EmptyOutput);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))?;
    let object = value.as_object().ok_or_else(|| {
        CollaboratorError::MalformedResponse("classifier output is not a JSON object".to_string())
    })?;

    let label = object
        .get("match")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(NONE_LABEL)
        .to_string();
    let corrected_native = object
        .get("correctedNative")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string);

    Ok(ClassifierVerdict {
        label,
        corrected_native,
    })
}

/// Trims translation output and removes one layer of wrapping quotes.
pub fn parse_translation_output(content: &str) -> Result<String, CollaboratorError> {
    let trimmed = strip_code_fence(content);
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        Err(CollaboratorError::EmptyOutput)
    } else {
        Ok(unquoted.to_string())
    }
}
