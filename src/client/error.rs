//! Normalized client-side error taxonomy
//!
//! Transport failures are classified before reaching calling code, so
//! callers never see raw HTTP plumbing. The type is `Clone` because a
//! refresh outcome is shared verbatim with every waiter of the flight.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Could not reach the server at all
    #[error("Network connection failed")]
    NetworkUnavailable,

    #[error("Request timed out")]
    Timeout,

    /// Non-401 failure status with the message extracted from the error body
    #[error("{1}")]
    ServerError(u16, String),

    /// 401 on an outbound call; triggers refresh on non-auth endpoints
    #[error("{0}")]
    Unauthorized(String),

    /// Terminal: the refresh itself failed and the session was purged
    #[error("Session expired")]
    SessionExpired,

    /// Response body did not match the protocol contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Persisted session storage failed
    #[error("Session storage error: {0}")]
    Storage(String),
}
