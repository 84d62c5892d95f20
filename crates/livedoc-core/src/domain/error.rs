//! Domain-level error taxonomy for livedoc.

/// Errors returned by an external collaborator (generator, sandbox service,
/// evaluator).
///
/// These never abort a pipeline run on their own; the orchestrator decides
/// whether to fall back, record a failure, or stop the correction loop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("service not configured: {0}")]
    Unavailable(String),

    #[error("service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    #[error("service call timed out")]
    Timeout,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ServiceError::Timeout;
        }
        if err.is_decode() {
            return ServiceError::InvalidResponse(err.to_string());
        }
        match err.status() {
            Some(status) => ServiceError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => ServiceError::Transport(err.to_string()),
        }
    }
}

/// livedoc domain errors.
#[derive(Debug, thiserror::Error)]
pub enum LivedocError {
    #[error("diff content is empty")]
    EmptyDiff,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("evaluation failed: {0}")]
    Evaluation(#[source] ServiceError),

    #[error("git error: {0}")]
    GitError(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for livedoc domain operations.
pub type Result<T> = std::result::Result<T, LivedocError>;
