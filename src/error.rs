use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavigatorError>;

/// Error type for the Cultural Navigator service
#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The assistant backend rejected the call because a run is still
    /// active on the thread. Mapped to `Outcome::Waiting`, never surfaced
    /// as an error to the caller.
    #[error("A run is already active on thread {thread_id}")]
    ActiveRun { thread_id: String },

    #[error("Assistant API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Failed to create Redis pool: {0}")]
    PoolCreation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NavigatorError {
    /// Whether this error means the thread already has an active run.
    ///
    /// Covers both our own typed variant and the backend's textual
    /// rejection ("... while a run ... is active") in case it arrives
    /// wrapped in a generic API error.
    pub fn is_active_run_conflict(&self) -> bool {
        match self {
            NavigatorError::ActiveRun { .. } => true,
            NavigatorError::Api { message, .. } => {
                message.contains("while a run") && message.contains("is active")
            }
            _ => false,
        }
    }
}
