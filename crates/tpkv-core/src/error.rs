use thiserror::Error;

#[derive(Debug, Error)]
pub enum TpkvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] bincode::Error),
    #[error("malformed date '{0}'")]
    MalformedDate(String),
    #[error("record '{key}' has no field '{field}'")]
    MissingField { key: String, field: String },
    #[error("record '{key}' field '{field}' holds unparsable value '{value}'")]
    MalformedField {
        key: String,
        field: String,
        value: String,
    },
    #[error("{file}:{line}: {reason}")]
    MalformedRow {
        file: String,
        line: usize,
        reason: String,
    },
    #[error("key '{key}' holds a value of the wrong kind")]
    WrongType { key: String },
}

pub type Result<T> = std::result::Result<T, TpkvError>;
