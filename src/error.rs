use thiserror::Error;

/// Errors produced by the task store and the session layer.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was empty after trimming.
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    /// Undo was requested with no recorded history.
    #[error("nothing to undo")]
    EmptyHistory,

    /// The persisted task list could not be decoded.
    #[error("stored task list is malformed: {0}")]
    StorageDecode(#[source] serde_json::Error),

    /// The task list could not be encoded for storage.
    #[error("failed to encode task list: {0}")]
    StorageEncode(#[source] serde_json::Error),

    /// Text that should name a priority, filter, sort key or date did not.
    #[error("invalid {kind} '{value}': {expected}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self::InvalidValue {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
