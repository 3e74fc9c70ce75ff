//! Credential and token authority
//!
//! Verifies identity claims and manages the signed token pair:
//! - password hashing and verification (bcrypt)
//! - JWT access/refresh token signing and validation with distinct secrets
//! - registration, login, refresh rotation and current-user lookup

mod jwt;
mod password;
mod service;

pub use jwt::{AccessClaims, JwtError, RefreshClaims, TokenKeys};
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthService};
