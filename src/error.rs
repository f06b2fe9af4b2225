use thiserror::Error;

pub type ChatResult<T> = Result<T, ChatError>;

/// Failure kinds surfaced by the presence engine and its stores.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing field, reserved name, bad message type or limit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A participant with this name is already active.
    #[error("participant `{0}` already exists")]
    Conflict(String),
    #[error("participant `{0}` not found")]
    NotFound(String),
    /// Viewer identity missing from the request.
    #[error("missing or invalid user")]
    Unauthorized,
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ChatError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}
