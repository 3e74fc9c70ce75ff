//! Uniform response envelope shared by server and client
//!
//! Every endpoint answers `{success, message, data}`; validation failures
//! additionally carry a field-keyed `errors` map (see [`crate::error`]).

use serde::{Deserialize, Serialize};

/// Response envelope. `data` is always present, `null` on failure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful envelope wrapping `data`.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
