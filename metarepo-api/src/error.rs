use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Retry budget exhausted for collection {collection} after {attempts} attempts")]
    RetryBudgetExhausted { collection: String, attempts: u32 },
}

impl ApiError {
    /// Unknown or renamed collections answer 404 and are recovered as an
    /// empty result rather than an error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Authentication failures are terminal for one collection but never
    /// retried and never abort the run.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}
