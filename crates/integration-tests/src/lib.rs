//! End-to-end tests for the Lampstand client.
//!
//! Each test starts a [`wiremock`] server standing in for the backend and
//! drives a real [`ApiClient`] against it, so requests go through the HTTP
//! stack, the token refresh path and the query cache exactly as in an app.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lampstand-integration-tests
//! ```
//!
//! No external services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lampstand_client::{
    ApiClient, ClientConfig, CredentialStore, MemoryCredentialStore, StalenessConfig,
};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Path prefix the client's base URL points at.
pub const API_PREFIX: &str = "/api";

/// Access token the store starts with.
pub const INITIAL_TOKEN: &str = "initial-token";

/// Token handed out by the refresh endpoint.
pub const REFRESHED_TOKEN: &str = "refreshed-token";

/// Mock backend plus a client wired to it.
pub struct TestBackend {
    pub server: MockServer,
    pub store: Arc<MemoryCredentialStore>,
    pub client: ApiClient,
    expired: Arc<AtomicUsize>,
}

impl TestBackend {
    /// Signed-in client with default staleness windows.
    pub async fn start() -> Self {
        Self::start_with(StalenessConfig::default(), Some(INITIAL_TOKEN)).await
    }

    /// Signed-in client whose every cached read goes stale after `window`.
    pub async fn with_staleness(window: Duration) -> Self {
        Self::start_with(StalenessConfig::uniform(window), Some(INITIAL_TOKEN)).await
    }

    /// Signed-in client whose requests give up after `timeout`.
    pub async fn with_timeout(timeout: Duration) -> Self {
        Self::configured(Some(INITIAL_TOKEN), |config| config.request_timeout = timeout).await
    }

    /// Client with explicit staleness and an optional starting token.
    pub async fn start_with(staleness: StalenessConfig, token: Option<&str>) -> Self {
        Self::configured(token, |config| config.staleness = staleness).await
    }

    async fn configured(token: Option<&str>, configure: impl FnOnce(&mut ClientConfig)) -> Self {
        let server = MockServer::start().await;

        let mut config = ClientConfig::new(&format!("{}{API_PREFIX}", server.uri()))
            .expect("mock server URI is a valid base URL");
        config.request_timeout = Duration::from_secs(5);
        configure(&mut config);

        let store = Arc::new(
            token.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_token),
        );
        let client = ApiClient::new(&config, Arc::clone(&store) as Arc<dyn CredentialStore>)
            .expect("client builds");

        let expired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&expired);
        client.on_session_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            server,
            store,
            client,
            expired,
        }
    }

    /// How many times the session-expired callback has run.
    #[must_use]
    pub fn expired_callbacks(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }

    /// The stored access token, exposed for assertions.
    #[must_use]
    pub fn stored_token(&self) -> Option<String> {
        use secrecy::ExposeSecret;
        self.store
            .access_token()
            .map(|token| token.expose_secret().to_string())
    }
}

/// Full API path for an endpoint path.
#[must_use]
pub fn api_path(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

/// Bearer header value for `token`.
#[must_use]
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// =============================================================================
// Response bodies
// =============================================================================

/// Successful envelope around `data`.
#[must_use]
pub fn ok(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

/// Successful list envelope with single-page pagination.
#[must_use]
pub fn page(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({
        "success": true,
        "data": items,
        "pagination": { "page": 1, "limit": 20, "total": total, "pages": 1 }
    })
}

/// Failed envelope carrying `message`.
#[must_use]
pub fn failure(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

/// Refresh or login response granting `token`.
#[must_use]
pub fn auth(token: &str) -> Value {
    json!({
        "success": true,
        "token": token,
        "user": user()
    })
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn user() -> Value {
    json!({ "_id": "u1", "email": "admin@example.com", "name": "Priscilla", "role": "admin" })
}

#[must_use]
pub fn topic(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "scriptures": ["John 3:16"],
        "quotes": [],
        "image": "grace.jpg",
        "isActive": true,
        "createdAt": "2024-03-01T09:00:00Z",
        "updatedAt": "2024-03-01T09:00:00Z"
    })
}

#[must_use]
pub fn question(id: &str, topic_id: &str, text: &str) -> Value {
    json!({
        "_id": id,
        "question": text,
        "topicId": topic_id,
        "dateAsked": "2024-03-02T10:00:00Z",
        "answers": []
    })
}

/// Message in thread `thread`, created `minute` minutes past the hour.
#[must_use]
pub fn message(id: &str, parent: Option<&str>, thread: &str, minute: u32) -> Value {
    json!({
        "_id": id,
        "content": format!("message {id}"),
        "author": "Lydia",
        "authorType": "user",
        "dateCreated": format!("2024-03-01T09:{minute:02}:00Z"),
        "parentId": parent,
        "threadId": thread,
        "topicId": "t1",
        "level": u32::from(parent.is_some()),
        "isEdited": false,
        "isHidden": false
    })
}
