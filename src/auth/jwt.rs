//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with distinct secrets so an access
//! token can never be replayed as a refresh token. Tokens are stateless:
//! validity is decided by signature and expiry alone.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Access and refresh secrets must differ")]
    IdenticalSecrets,

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Per-issuance token ID; makes back-to-back rotations byte-distinct
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Claims carried by a refresh token: the user id and nothing else
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for both token kinds
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenKeys {
    /// Build the key set, rejecting identical secrets.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self, JwtError> {
        if access_secret == refresh_secret {
            return Err(JwtError::IdenticalSecrets);
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        })
    }

    /// Sign an access token for `user` with the given lifetime.
    pub fn sign_access_token(&self, user: &User, ttl_seconds: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Sign a refresh token carrying only the user id.
    pub fn sign_refresh_token(&self, user_id: Uuid, ttl_days: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(ttl_days)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify an access token's signature and expiry.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Verify a refresh token's signature and expiry.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    // No leeway: a 15-minute token is invalid at 15:01.
    validation.leeway = 0;
    validation
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> JwtError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::InvalidToken,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::UserRole;

    use super::*;

    fn test_keys() -> TokenKeys {
        TokenKeys::new("access-test-secret", "refresh-test-secret").unwrap()
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
            verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn identical_secrets_rejected() {
        let result = TokenKeys::new("same-secret", "same-secret");
        assert!(matches!(result, Err(JwtError::IdenticalSecrets)));
    }

    #[test]
    fn access_token_round_trip() {
        let keys = test_keys();
        let user = test_user();

        let token = keys.sign_access_token(&user, 900).unwrap();
        let claims = keys.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_round_trip() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();

        let token = keys.sign_refresh_token(user_id, 7).unwrap();
        let claims = keys.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn access_token_is_not_a_valid_refresh_token() {
        let keys = test_keys();
        let user = test_user();

        let access = keys.sign_access_token(&user, 900).unwrap();
        assert!(matches!(
            keys.verify_refresh_token(&access),
            Err(JwtError::InvalidToken)
        ));

        let refresh = keys.sign_refresh_token(user.id, 7).unwrap();
        assert!(matches!(
            keys.verify_access_token(&refresh),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let keys = test_keys();
        let other = TokenKeys::new("other-access", "other-refresh").unwrap();
        let user = test_user();

        let token = keys.sign_access_token(&user, 900).unwrap();
        assert!(other.verify_access_token(&token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let keys = test_keys();
        let user = test_user();

        let token = keys.sign_access_token(&user, -60).unwrap();
        assert!(matches!(
            keys.verify_access_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn malformed_token_rejected() {
        let keys = test_keys();
        assert!(matches!(
            keys.verify_refresh_token("not.a.token"),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            keys.verify_refresh_token(""),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn immediate_reissue_produces_distinct_tokens() {
        let keys = test_keys();
        let user = test_user();

        let first = keys.sign_refresh_token(user.id, 7).unwrap();
        let second = keys.sign_refresh_token(user.id, 7).unwrap();
        assert_ne!(first, second);

        let first = keys.sign_access_token(&user, 900).unwrap();
        let second = keys.sign_access_token(&user, 900).unwrap();
        assert_ne!(first, second);
    }
}
