use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomebaseError {
    #[error("Invalid {field} timestamp: {source}")]
    InvalidTimestamp {
        field: &'static str,
        source: chrono::ParseError,
    },

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unknown model kind: {0}")]
    UnknownKind(String),

    #[error("Serialized record is missing its type tag")]
    MissingTypeTag,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HomebaseError>;
