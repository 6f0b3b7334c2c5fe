//! Backend client error types.
//!
//! Defined in `examwalk-core` so the progress collector can downcast and
//! classify errors for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when talking to the ExamWalk backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The bearer token was rejected (401/403).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ClientError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            ClientError::AuthenticationFailed(_)
            | ClientError::NotFound(_)
            | ClientError::InvalidResponse(_) => true,
            ClientError::ApiError { status, .. } => *status < 500,
            ClientError::RateLimited { .. }
            | ClientError::Timeout(_)
            | ClientError::NetworkError(_) => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ClientError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
