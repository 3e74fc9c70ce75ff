//! Session coordinator (client side)
//!
//! Holds the current access token, attaches it to outbound calls, detects
//! authorization failures, and renews the token pair with single-flight
//! refresh: concurrent 401s collapse into one refresh call whose outcome is
//! shared by every waiter.

mod error;
mod http;
mod session;
mod storage;

pub use error::ClientError;
pub use http::ApiClient;
pub use session::{RefreshTransport, Session};
pub use storage::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
