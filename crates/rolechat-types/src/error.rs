use thiserror::Error;

/// Errors from repository operations (used by trait definitions in rolechat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised while talking to the upstream agent provider.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Non-2xx response. `body` carries whatever the provider returned.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream response could not be decoded: {0}")]
    Deserialization(String),

    #[error("upstream stream failed: {0}")]
    Stream(String),
}

impl UpstreamError {
    /// Human-readable detail suitable for an SSE error payload.
    pub fn detail(&self) -> String {
        match self {
            UpstreamError::Status { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors related to role management.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("role not found")]
    NotFound,

    #[error("invalid role name: {0}")]
    InvalidName(String),

    #[error("role already bound to a different agent")]
    AgentAlreadyBound,

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<RepositoryError> for RoleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => RoleError::NotFound,
            RepositoryError::Conflict(_) => RoleError::AgentAlreadyBound,
            other => RoleError::Storage(other.to_string()),
        }
    }
}

/// Errors that abort a chat turn before any event-stream bytes are sent.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("role not found")]
    RoleNotFound,

    #[error("role has no bound agent")]
    AgentNotBound,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("storage error: {0}")]
    Storage(String),
}

/// A `data:` record whose payload was not usable JSON.
#[derive(Debug, Error)]
#[error("malformed event payload: {0}")]
pub struct DecodeError(pub String);
