//! Route composition

mod auth;

use axum::{routing::get, Router};

use crate::state::AppState;

pub use auth::auth_routes;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
