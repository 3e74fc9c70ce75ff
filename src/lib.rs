//! authgate
//!
//! A credential-based authentication layer in two halves:
//!
//! - the **token authority** (server side): registration, login, refresh
//!   rotation and current-user lookup over signed JWT access/refresh pairs;
//! - the **session coordinator** (client side): attaches the access token to
//!   outbound calls, intercepts 401s, and renews the pair with single-flight
//!   refresh so concurrent failures collapse into one refresh call.
//!
//! Both halves share the protocol contract in [`models`], [`response`] and
//! the error taxonomy.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
