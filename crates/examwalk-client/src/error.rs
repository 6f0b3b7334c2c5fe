//! Client error types.
//!
//! The error enum lives in `examwalk-core` so retry logic there can
//! downcast it; this module re-exports it and maps transport failures.

pub use examwalk_core::error::ClientError;

/// Map a reqwest transport error onto [`ClientError`].
pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(timeout_secs)
    } else {
        ClientError::NetworkError(err.to_string())
    }
}
