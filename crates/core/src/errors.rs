use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ScheduleError {
    /// Stable machine-readable name of the variant, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::NotFound(_) => "not_found",
            ScheduleError::Validation(_) => "validation",
            ScheduleError::Reference(_) => "reference",
            ScheduleError::Conflict(_) => "conflict",
            ScheduleError::State(_) => "state",
            ScheduleError::Authentication(_) => "authentication",
            ScheduleError::Authorization(_) => "authorization",
            ScheduleError::Upstream(_) => "upstream",
            ScheduleError::Database(_) => "database",
            ScheduleError::Internal(_) => "internal",
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
