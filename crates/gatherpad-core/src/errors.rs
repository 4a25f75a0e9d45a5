use std::path::PathBuf;

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the notepad
/// core can handle failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Notepad operation failures.
///
/// Everything except `Storage` is a validation outcome that short-circuits
/// before the store is touched.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("empty gathering code")]
    EmptyInput,

    #[error("gathering code already registered at line {line}")]
    DuplicateCode { line: usize },

    #[error("no line numbers in delete spec")]
    InvalidLineSpec,

    #[error("no requested line is within 1..={count}")]
    NoValidIndices { count: usize },

    #[error(transparent)]
    Storage(#[from] Error),
}

impl From<std::io::Error> for NoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(Error::Io(e))
    }
}

pub type NoteResult<T> = std::result::Result<T, NoteError>;
