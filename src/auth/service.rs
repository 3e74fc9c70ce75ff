//! Authentication service
//!
//! Business logic for registration, login, refresh rotation and current-user
//! lookup. Stateless across calls: no record of issued tokens is kept, so a
//! refresh token stays honored until it expires (no per-token revocation).

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthPayload, TokenPair, User, UserResponse, UserRole};
use crate::store::{NewUser, StoreError, UserStore};

use super::jwt::{AccessClaims, JwtError, TokenKeys};
use super::password::{hash_password, verify_password};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Uniqueness violation at registration; field is `"email"` or `"username"`
    #[error("{0} already used")]
    Conflict(&'static str),

    /// Login mismatch. Identical for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token malformed, expired or signed with the wrong secret
    #[error("Invalid token")]
    InvalidToken,

    /// Token was valid but its subject no longer exists
    #[error("User not found")]
    UserNotFound,

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => AuthError::Conflict(field),
            StoreError::Backend(msg) => AuthError::Store(msg),
        }
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::Hashing(e.to_string())
    }
}

/// Credential and token authority.
///
/// Owns the signing keys and the user store seam; every operation is
/// independent, so concurrent calls need no coordination here.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: TokenKeys,
    access_ttl_seconds: i64,
    refresh_ttl_days: i64,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        keys: TokenKeys,
        access_ttl_seconds: i64,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            store,
            keys,
            access_ttl_seconds,
            refresh_ttl_days,
        }
    }

    /// Register a new account and issue its first token pair.
    ///
    /// Email is checked for prior use before username; the store enforces
    /// both constraints atomically as well, so a racing duplicate insert
    /// still surfaces as the same conflict.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict("email"));
        }
        if self.store.find_by_username(username).await?.is_some() {
            return Err(AuthError::Conflict("username"));
        }

        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: UserRole::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        self.issue_payload(user)
    }

    /// Verify email/password credentials and issue a fresh token pair.
    ///
    /// Unknown email and wrong password produce the identical error so the
    /// response does not leak which part failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let correct = verify_password(password, &user.password_hash)?;
        if !correct {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.id, "Login succeeded");

        self.issue_payload(user)
    }

    /// Validate a refresh token and rotate the pair.
    ///
    /// Bad signature, expiry and malformed input all map to `InvalidToken`;
    /// a structurally valid token whose subject is gone maps to
    /// `UserNotFound`. The old pair is not tracked and cannot be revoked.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthPayload, AuthError> {
        let claims = self
            .keys
            .verify_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::debug!(user_id = %user.id, "Token pair rotated");

        self.issue_payload(user)
    }

    /// Return the stripped projection for a known user id.
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// Verify an access token. Pure, side-effect-free.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.keys.verify_access_token(token)
    }

    fn issue_payload(&self, user: User) -> Result<AuthPayload, AuthError> {
        let access_token = self
            .keys
            .sign_access_token(&user, self.access_ttl_seconds)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))?;
        let refresh_token = self
            .keys
            .sign_refresh_token(user.id, self.refresh_ttl_days)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))?;

        Ok(AuthPayload {
            tokens: TokenPair {
                access_token,
                refresh_token,
            },
            user: user.into(),
        })
    }
}
