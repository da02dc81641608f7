//! Error types for the calendar renderer

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for calendar operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Request key as the caller spelled it (e.g. `theme`)
    pub field: String,
    /// Human readable reason
    pub message: String,
}

/// Every problem found while resolving a request, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error was recorded against `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Errors that can occur while resolving, rendering or converting a calendar
#[derive(Error, Debug)]
pub enum Error {
    /// One or more request fields were rejected
    #[error("Invalid configuration: {0}")]
    ConfigValidation(ValidationErrors),

    /// The request body was not a JSON object
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Output format not understood
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// A raster format was requested but no converter backend is available
    #[error("PNG/PDF conversion is not available in this build")]
    ConversionUnavailable,

    /// Failed to start the conversion backend
    #[error("Converter initialization failed: {0}")]
    InitializationError(String),

    /// The conversion backend failed on a document
    #[error("Conversion failed: {0}")]
    ConversionError(String),

    /// HTTP transport failure
    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::ConfigValidation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_joins_fields() {
        let mut errs = ValidationErrors::new();
        errs.push("theme", "unknown theme");
        errs.push("lat", "must be a finite number");
        let err = Error::from(errs);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: theme: unknown theme; lat: must be a finite number"
        );
    }

    #[test]
    fn validation_errors_serialize_as_list() {
        let mut errs = ValidationErrors::new();
        errs.push("theme", "bad");
        let js = serde_json::to_value(&errs).unwrap();
        assert_eq!(js, serde_json::json!([{ "field": "theme", "message": "bad" }]));
    }
}
