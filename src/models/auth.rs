//! Request and response DTOs for the authentication endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserResponse;

/// Request body for `POST /auth/register`
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be between 1 and 100 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    pub password: String,
}

/// Request body for `POST /auth/login`
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
///
/// The refresh token travels only in the body, never as a bearer credential.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// A freshly issued access/refresh pair.
///
/// Both tokens are replaced wholesale on every successful refresh.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Payload returned by register, login and refresh
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthPayload {
    pub tokens: TokenPair,
    pub user: UserResponse,
}
