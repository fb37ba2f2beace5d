use serde::Serialize;

/// A single recoverable field failure, suitable for re-presenting the
/// offending draft to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, "this field is required")
    }
}

/// Trim a raw text field, recording a `required` error when it is empty.
pub fn require_text(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::required(field));
        None
    } else {
        Some(trimmed.to_string())
    }
}
