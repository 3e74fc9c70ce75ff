//! HTTP API client
//!
//! Wraps `reqwest` with the session coordinator: the access token rides as a
//! bearer credential on every authenticated call, a 401 on a non-auth
//! endpoint triggers (or joins) the single-flight refresh, and the call is
//! retried exactly once with the new token. Transport failures are
//! normalized into [`ClientError`] before reaching calling code.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{AuthPayload, LoginRequest, RefreshRequest, RegisterRequest, UserResponse};
use crate::response::Envelope;

use super::error::ClientError;
use super::session::{RefreshTransport, Session};
use super::storage::SessionStore;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Endpoints that must never go through the 401 -> refresh interception:
/// refreshing a failed login, registration or refresh call would recurse.
const AUTH_ENDPOINTS: [&str; 3] = ["/auth/register", "/auth/login", "/auth/refresh"];

/// Whether a path targets one of the authentication endpoints themselves
fn is_auth_endpoint(path: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| path.starts_with(endpoint))
}

/// Explicit retry marker threaded through the request loop.
///
/// A call carries `First` on its initial attempt; after one post-refresh
/// retry it carries `Retry` and a second 401 is surfaced as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// API client owning the session handle.
///
/// Clone is cheap: `reqwest::Client` and the session share state internally.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
    refresher: Arc<dyn RefreshTransport>,
}

impl ApiClient {
    /// Create a client against `base_url`, restoring any persisted session.
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        let session = Session::new(store);
        session.load()?;

        let refresher: Arc<dyn RefreshTransport> = Arc::new(HttpRefresher {
            http: http.clone(),
            base_url: base_url.clone(),
        });

        Ok(Self {
            http,
            base_url,
            session,
            refresher,
        })
    }

    /// Handle to the underlying session (expiry callback, cached user).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register a new account and install the issued session.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let payload: AuthPayload = self
            .request_data(Method::POST, "/auth/register", Some(&body))
            .await?;

        self.session.install(&payload)?;
        Ok(payload)
    }

    /// Log in and install the issued session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let payload: AuthPayload = self
            .request_data(Method::POST, "/auth/login", Some(&body))
            .await?;

        self.session.install(&payload)?;
        Ok(payload)
    }

    /// End the session locally: tokens are stateless server-side, so logout
    /// is a client-side purge.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Fetch the current user's projection.
    pub async fn current_user(&self) -> Result<UserResponse, ClientError> {
        self.request_data(Method::GET, "/auth/me", None::<&()>).await
    }

    /// Authenticated GET returning the full envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ClientError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// Authenticated POST returning the full envelope.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request_data<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let envelope = self.request(method, path, body).await?;
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Response carried no data".to_string()))
    }

    /// Core request loop with 401 interception and retry-once.
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ClientError> {
        let mut attempt = Attempt::First;

        loop {
            let token = self.session.access_token();
            let result = self.send(method.clone(), path, body, token.as_deref()).await;

            match result {
                Err(ClientError::Unauthorized(_))
                    if attempt == Attempt::First && !is_auth_endpoint(path) =>
                {
                    // Join or start the single refresh, then retry once with
                    // the token it installed.
                    self.session.refresh(self.refresher.clone()).await?;
                    attempt = Attempt::Retry;
                }
                other => return other,
            }
        }
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<Envelope<T>, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status.is_success() {
            response
                .json::<Envelope<T>>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_failure(status, &body))
        }
    }
}

/// Refresh transport over plain HTTP, outside the interceptor.
struct HttpRefresher {
    http: Client,
    base_url: String,
}

#[async_trait]
impl RefreshTransport for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthPayload, ClientError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let envelope: Envelope<AuthPayload> = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Refresh response carried no data".to_string()))
    }
}

/// Classify connection-level failures: connectivity first, then timeout.
fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_connect() {
        return ClientError::NetworkUnavailable;
    }
    if e.is_timeout() {
        return ClientError::Timeout;
    }
    ClientError::InvalidResponse(e.to_string())
}

/// Classify a failure status plus its body into the normalized taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> ClientError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(message)
    } else {
        ClientError::ServerError(status.as_u16(), message)
    }
}

/// Pull a human-readable message out of a structured error body.
///
/// Checked in order: `message`, `error`, first entry of `errors`, `detail`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }

    if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }
    if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
        return Some(error.to_string());
    }
    if let Some(errors) = value.get("errors") {
        let first = match errors {
            serde_json::Value::Array(items) => items.first(),
            serde_json::Value::Object(map) => map
                .values()
                .next()
                .and_then(|v| v.as_array())
                .and_then(|items| items.first()),
            _ => None,
        };
        if let Some(message) = first.and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }
    if let Some(detail) = value.get("detail").and_then(|v| v.as_str()) {
        return Some(detail.to_string());
    }

    None
}
