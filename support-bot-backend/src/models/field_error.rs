use serde::Serialize;

/// A single field-level error reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: &str) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.to_string(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, "It should be a mandatory field", "missing_field")
    }

    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, message, "invalid_value")
    }

    pub fn datatype_mismatch(field: &str, expected: &str) -> Self {
        Self::new(
            field,
            format!("It should be a/an {}", expected),
            "datatype_mismatch",
        )
    }

    pub fn unknown_field(field: &str) -> Self {
        Self::new(field, "Unexpected/invalid field in request", "invalid_field")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
