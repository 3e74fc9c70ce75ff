//! User store seam for the token authority
//!
//! The authority treats the account store as an external collaborator behind
//! the [`UserStore`] trait. Production uses the Postgres implementation;
//! tests use [`MemoryUserStore`]. Either way the store itself must enforce
//! email/username uniqueness atomically: the authority's pre-checks exist
//! only to pick the right conflict message, the store is the arbiter under
//! concurrent registration.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{User, UserRole};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Store-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Uniqueness violation on insert; the field is `"email"` or `"username"`
    #[error("{0} already used")]
    Conflict(&'static str),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Fields required to create a new user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Persistent user account store.
///
/// Lookups return `Ok(None)` for missing records; only backend failures are
/// errors.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a new user, rejecting duplicate email or username atomically.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
}
