use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActionError>;

/// Raised while building adapter definitions or parsing mappings. These are
/// programmer/config errors and surface once, before any event is processed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid directive: {0}")]
    InvalidDirective(String),

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    #[error("Mapping references unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
}

/// A timestamp value that could not be read as an absolute instant.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Malformed timestamp in field {field:?}: {value}")]
pub struct MalformedTimestamp {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Encode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Field {field:?} expected {expected}, got {actual}")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    MalformedTimestamp(#[from] MalformedTimestamp),

    #[error("Action {action:?} does not support {mode} dispatch")]
    UnsupportedDispatch { action: String, mode: &'static str },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// JSON type name used in mismatch errors.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
