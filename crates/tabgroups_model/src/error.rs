use serde::Serialize;
use thiserror::Error;

/// Errors raised while decoding persisted or imported data.
///
/// Lookups and guarded mutations never produce these; absence is reported as
/// `None` or `false`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ModelError {
    #[error("failed to parse tab groups data: {0}")]
    Parse(String),
    #[error("failed to serialize tab groups data: {0}")]
    Serialize(String),
    #[error("unrecognized import format: {0}")]
    UnrecognizedFormat(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Parse(e.to_string())
    }
}

impl From<ModelError> for String {
    fn from(e: ModelError) -> Self {
        e.to_string()
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
