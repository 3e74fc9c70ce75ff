//! Data model shared by the token authority and the session coordinator

mod auth;
mod user;

pub use auth::{AuthPayload, LoginRequest, RefreshRequest, RegisterRequest, TokenPair};
pub use user::{User, UserResponse, UserRole};
