//! Client-held session state and single-flight refresh
//!
//! State machine per session: Anonymous -> Authenticated -> (on 401)
//! Refreshing -> Authenticated | Anonymous. While Refreshing, every caller
//! that observes a 401 joins the one outstanding refresh instead of starting
//! another; the guard slot is cleared inside the flight before any waiter's
//! continuation runs, so a later episode starts cleanly.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::Mutex as AsyncMutex;

use crate::models::AuthPayload;

use super::error::ClientError;
use super::storage::{PersistedSession, SessionStore};

/// Transport seam for the refresh call itself.
///
/// Implementations must send the refresh token in the request body, never as
/// a bearer credential, and must not route through the 401 interceptor.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthPayload, ClientError>;
}

/// The one outstanding refresh, shared by every joiner
type RefreshFlight = Shared<BoxFuture<'static, Result<String, ClientError>>>;

type ExpiryCallback = Box<dyn Fn() + Send + Sync>;

struct SessionInner {
    /// Volatile current access token
    access_token: RwLock<Option<String>>,
    store: Arc<dyn SessionStore>,
    /// Single-flight guard: `Some` while a refresh is outstanding
    flight: AsyncMutex<Option<RefreshFlight>>,
    /// Invoked exactly once per failed refresh episode
    on_expired: Mutex<Option<ExpiryCallback>>,
}

/// Client-side session, owned by the API client and passed by handle.
///
/// Cloning shares the same underlying state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                access_token: RwLock::new(None),
                store,
                flight: AsyncMutex::new(None),
                on_expired: Mutex::new(None),
            }),
        }
    }

    /// Restore the in-memory token from persisted storage, if any.
    pub fn load(&self) -> Result<bool, ClientError> {
        let persisted = self
            .inner
            .store
            .load()
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        match persisted {
            Some(session) => {
                *self.inner.access_token.write().unwrap() = Some(session.access_token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Install a freshly issued pair: memory and all persisted entries.
    pub fn install(&self, payload: &AuthPayload) -> Result<(), ClientError> {
        *self.inner.access_token.write().unwrap() =
            Some(payload.tokens.access_token.clone());

        self.inner
            .store
            .save(&PersistedSession {
                access_token: payload.tokens.access_token.clone(),
                refresh_token: payload.tokens.refresh_token.clone(),
                user: payload.user.clone(),
            })
            .map_err(|e| ClientError::Storage(e.to_string()))
    }

    /// Current access token, if authenticated.
    pub fn access_token(&self) -> Option<String> {
        self.inner.access_token.read().unwrap().clone()
    }

    /// Last-known user projection from persisted storage.
    pub fn user(&self) -> Option<crate::models::UserResponse> {
        self.inner
            .store
            .load()
            .ok()
            .flatten()
            .map(|session| session.user)
    }

    /// Drop back to Anonymous: purge memory and persisted entries.
    pub fn clear(&self) {
        *self.inner.access_token.write().unwrap() = None;
        if let Err(e) = self.inner.store.clear() {
            tracing::warn!(error = %e, "Failed to clear session storage");
        }
    }

    /// Register the session-ended callback. Invoked synchronously at the
    /// point of terminal refresh failure, at most once per episode.
    pub fn on_session_expired<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.on_expired.lock().unwrap() = Some(Box::new(callback));
    }

    /// Renew the token pair, collapsing concurrent callers into one flight.
    ///
    /// The first caller to find the guard empty starts the refresh and
    /// publishes the shared future; everyone else awaits it. On success the
    /// new access token is installed and returned to all waiters. On any
    /// failure (including timeout) the session is purged, the expiry
    /// callback fires once, and every waiter gets `SessionExpired`.
    pub async fn refresh(
        &self,
        transport: Arc<dyn RefreshTransport>,
    ) -> Result<String, ClientError> {
        let flight = {
            let mut slot = self.inner.flight.lock().await;
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    let inner = self.inner.clone();
                    let flight: RefreshFlight = async move {
                        let result = run_refresh(&inner, transport).await;
                        // Clear the guard before any waiter resumes.
                        *inner.flight.lock().await = None;
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }
}

async fn run_refresh(
    inner: &Arc<SessionInner>,
    transport: Arc<dyn RefreshTransport>,
) -> Result<String, ClientError> {
    let refresh_token = inner
        .store
        .load()
        .ok()
        .flatten()
        .map(|session| session.refresh_token);

    let Some(refresh_token) = refresh_token else {
        tracing::debug!("Refresh requested with no stored refresh token");
        expire(inner);
        return Err(ClientError::SessionExpired);
    };

    match transport.refresh(&refresh_token).await {
        Ok(payload) => {
            let access_token = payload.tokens.access_token.clone();

            *inner.access_token.write().unwrap() = Some(access_token.clone());
            let save_result = inner.store.save(&PersistedSession {
                access_token: access_token.clone(),
                refresh_token: payload.tokens.refresh_token,
                user: payload.user,
            });
            if let Err(e) = save_result {
                tracing::warn!(error = %e, "Failed to persist rotated session");
            }

            tracing::debug!("Session refreshed");
            Ok(access_token)
        }
        Err(e) => {
            // A timed-out or rejected refresh ends the session either way.
            tracing::warn!(error = %e, "Refresh failed, ending session");
            expire(inner);
            Err(ClientError::SessionExpired)
        }
    }
}

/// Terminal path: purge everything, notify the presentation layer once.
fn expire(inner: &Arc<SessionInner>) {
    *inner.access_token.write().unwrap() = None;
    if let Err(e) = inner.store.clear() {
        tracing::warn!(error = %e, "Failed to clear session storage");
    }
    if let Some(callback) = inner.on_expired.lock().unwrap().as_ref() {
        callback();
    }
}
