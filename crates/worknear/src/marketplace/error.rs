use super::repository::RepositoryError;

/// Malformed input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("hourly rate must be greater than zero (got {0})")]
    NonPositiveRate(f64),
    #[error("total payment must not be negative (got {0})")]
    NegativePayment(f64),
    #[error("latitude must be within [-90, 90] (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be within [-180, 180] (got {0})")]
    LongitudeOutOfRange(f64),
    #[error("score must be between 1 and 5 (got {0})")]
    ScoreOutOfRange(i64),
    #[error("user {0} is not registered as a worker")]
    NotAWorker(String),
}

/// Typed failure returned by every marketplace operation.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("storage failure: {0}")]
    Storage(RepositoryError),
}

impl MarketplaceError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Stable machine-readable code for transport envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState(_) => "invalid_state",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<RepositoryError> for MarketplaceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Storage(other),
        }
    }
}
