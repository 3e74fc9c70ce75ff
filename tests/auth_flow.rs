//! End-to-end authentication flow over a live server.
//!
//! Each test boots the full router on an ephemeral port, backed by the
//! in-memory user store, and drives it through the HTTP client so the
//! request interceptor and single-flight refresh run against real wire
//! traffic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authgate::auth::{AuthService, TokenKeys};
use authgate::client::{ApiClient, ClientError, MemorySessionStore};
use authgate::models::{AuthPayload, RefreshRequest, TokenPair};
use authgate::routes::router;
use authgate::state::AppState;
use authgate::store::MemoryUserStore;

async fn spawn_server() -> String {
    let store = Arc::new(MemoryUserStore::new());
    let keys = TokenKeys::new("test-access-secret", "test-refresh-secret").unwrap();
    let service = AuthService::new(store, keys, 900, 7);
    let app = router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn new_client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Arc::new(MemorySessionStore::new())).unwrap()
}

#[tokio::test]
async fn register_login_and_refresh_issue_distinct_pairs() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let registered = client
        .register("alice", "alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(registered.user.username, "alice");
    assert_eq!(
        client.session().access_token().unwrap(),
        registered.tokens.access_token
    );

    let logged_in = client
        .login("alice@example.com", "password123")
        .await
        .unwrap();
    assert_ne!(
        logged_in.tokens.access_token,
        registered.tokens.access_token
    );

    // The authenticated call sees the most recent token's identity.
    let me = client.current_user().await.unwrap();
    assert_eq!(me.email, "alice@example.com");

    // Refreshing from the registration-era token still works and rotates
    // the whole pair into a third distinct one.
    let refreshed = client
        .post::<AuthPayload, RefreshRequest>(
            "/auth/refresh",
            &RefreshRequest {
                refresh_token: registered.tokens.refresh_token.clone(),
            },
        )
        .await
        .unwrap()
        .data
        .unwrap();
    assert_ne!(refreshed.tokens.access_token, registered.tokens.access_token);
    assert_ne!(refreshed.tokens.access_token, logged_in.tokens.access_token);
    assert_ne!(
        refreshed.tokens.refresh_token,
        registered.tokens.refresh_token
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_identically() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    client
        .register("bob", "bob@example.com", "password123")
        .await
        .unwrap();

    let wrong_password = client
        .login("bob@example.com", "nope-nope")
        .await
        .unwrap_err();
    let unknown_email = client
        .login("nobody@example.com", "password123")
        .await
        .unwrap_err();

    assert_eq!(
        wrong_password,
        ClientError::Unauthorized("Invalid credentials".to_string())
    );
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn duplicate_registration_reports_the_conflicting_field() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    client
        .register("carol", "carol@example.com", "password123")
        .await
        .unwrap();

    // Same email, different username: the email conflict wins.
    let err = client
        .register("carol2", "carol@example.com", "password123")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::ServerError(409, "email already used".to_string())
    );

    let err = client
        .register("carol", "carol2@example.com", "password123")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::ServerError(409, "username already used".to_string())
    );
}

#[tokio::test]
async fn invalid_registration_surfaces_validation_message() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let err = client
        .register("dave", "not-an-email", "password123")
        .await
        .unwrap_err();

    match err {
        ClientError::ServerError(422, message) => {
            assert_eq!(message, "Validation failed");
        }
        other => panic!("expected a 422, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_access_token_is_renewed_transparently() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let registered = client
        .register("erin", "erin@example.com", "password123")
        .await
        .unwrap();

    // Corrupt only the access token; the refresh token stays valid.
    client
        .session()
        .install(&AuthPayload {
            tokens: TokenPair {
                access_token: "garbage".to_string(),
                refresh_token: registered.tokens.refresh_token.clone(),
            },
            user: registered.user.clone(),
        })
        .unwrap();

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "erin");

    // The rotation installed a real token in place of the garbage one.
    let token = client.session().access_token().unwrap();
    assert_ne!(token, "garbage");
    assert_ne!(token, registered.tokens.refresh_token);
}

#[tokio::test]
async fn concurrent_stale_calls_all_succeed_after_one_rotation() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let registered = client
        .register("frank", "frank@example.com", "password123")
        .await
        .unwrap();

    client
        .session()
        .install(&AuthPayload {
            tokens: TokenPair {
                access_token: "garbage".to_string(),
                refresh_token: registered.tokens.refresh_token.clone(),
            },
            user: registered.user.clone(),
        })
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { client.current_user().await }));
    }

    for handle in handles {
        let me = handle.await.unwrap().unwrap();
        assert_eq!(me.username, "frank");
    }
}

#[tokio::test]
async fn anonymous_protected_call_ends_as_session_expired() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = expiries.clone();
    client.session().on_session_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // No session at all: the 401 triggers a refresh attempt, which finds no
    // refresh token and terminates the (empty) session.
    let err = client.current_user().await.unwrap_err();
    assert_eq!(err, ClientError::SessionExpired);
    assert_eq!(expiries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revoked_refresh_token_logs_the_user_out() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    let registered = client
        .register("grace", "grace@example.com", "password123")
        .await
        .unwrap();

    // Both tokens corrupted: the retry path has nothing valid to fall
    // back on, so the session ends.
    client
        .session()
        .install(&AuthPayload {
            tokens: TokenPair {
                access_token: "garbage".to_string(),
                refresh_token: "also-garbage".to_string(),
            },
            user: registered.user.clone(),
        })
        .unwrap();

    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = expiries.clone();
    client.session().on_session_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = client.current_user().await.unwrap_err();
    assert_eq!(err, ClientError::SessionExpired);
    assert_eq!(expiries.load(Ordering::SeqCst), 1);
    assert!(client.session().access_token().is_none());
}

#[tokio::test]
async fn protected_route_rejections_use_the_error_envelope() {
    let base_url = spawn_server().await;
    let http = reqwest::Client::new();

    // No bearer token at all.
    let resp = http
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authenticated");
    assert!(body["data"].is_null());

    // A malformed bearer token.
    let resp = http
        .get(format!("{base_url}/auth/me"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn logout_purges_the_session_locally() {
    let base_url = spawn_server().await;
    let client = new_client(&base_url);

    client
        .register("heidi", "heidi@example.com", "password123")
        .await
        .unwrap();
    assert!(client.session().access_token().is_some());

    client.logout();
    assert!(client.session().access_token().is_none());
    assert!(client.session().user().is_none());
}
