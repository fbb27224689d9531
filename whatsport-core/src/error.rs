use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Error taxonomy shared by every service.
///
/// State-machine refusals (`InvalidTransition`), authorization refusals
/// (`Unauthorized`) and duplicate guards are distinct variants so callers
/// can map them to different user-facing responses.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("user is already a member of this group")]
    AlreadyMember,

    #[error("user is already a participant of this event")]
    AlreadyParticipant,

    #[error("event has reached its maximum number of participants")]
    CapacityExceeded,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("concurrent update conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Store(String),
}

impl CoreError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        CoreError::Unauthorized(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        CoreError::InvalidTransition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        CoreError::Store(msg.into())
    }
}

impl From<diesel::result::Error> for CoreError {
    fn from(e: diesel::result::Error) -> Self {
        CoreError::Store(e.to_string())
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for CoreError {
    fn from(e: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        CoreError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Store(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Store(e.to_string())
    }
}
