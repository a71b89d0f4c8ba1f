//! Authenticated transport to the Lampstand REST backend.
//!
//! Every call goes through [`Gateway::request`], which attaches the stored
//! bearer token, unwraps the response envelope and recovers from an expired
//! access token by refreshing it once and retrying. The refresh token itself
//! is an HttpOnly cookie, so the HTTP client keeps a cookie store.
//!
//! Refreshes are single-flight: any number of requests failing with 401 at the
//! same time wait on one `/auth/refresh` call.

use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lampstand_core::{ApiResponse, AuthResponse, Page, User};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::session::{CredentialStore, SessionExpiredHandler};

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";

/// Longest response body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

type RefreshFuture = Shared<BoxFuture<'static, Result<SecretString>>>;

// =============================================================================
// ApiRequest
// =============================================================================

/// One backend call: method, path below the base URL, query and JSON body.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|_| "[BODY]"))
            .finish()
    }
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add the fields of `params` as query parameters.
    ///
    /// `None` fields are skipped; strings are sent verbatim and other scalars
    /// in their JSON form.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` unless `params` serializes to an
    /// object (or unit).
    pub fn with_query(mut self, params: &impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(params)
            .map_err(|e| ApiError::InvalidRequest(format!("query parameters: {e}")))?;

        match value {
            Value::Null => {}
            Value::Object(fields) => {
                for (key, value) in fields {
                    match value {
                        Value::Null => {}
                        Value::String(s) => self.query.push((key, s)),
                        other => self.query.push((key, other.to_string())),
                    }
                }
            }
            other => {
                return Err(ApiError::InvalidRequest(format!(
                    "query parameters must be an object, got {other}"
                )));
            }
        }

        Ok(self)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if `body` cannot be serialized.
    pub fn with_json(mut self, body: &impl Serialize) -> Result<Self> {
        self.body = Some(
            serde_json::to_value(body)
                .map_err(|e| ApiError::InvalidRequest(format!("request body: {e}")))?,
        );
        Ok(self)
    }

    fn triggers_refresh(&self) -> bool {
        self.path != LOGIN_PATH && self.path != REFRESH_PATH
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// HTTP transport with bearer authentication and token refresh.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    base_url: Url,
    store: Arc<dyn CredentialStore>,
    on_session_expired: RwLock<Option<SessionExpiredHandler>>,
    /// In-flight refresh shared by every request that hit a 401
    refresh: Mutex<Option<RefreshFuture>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway for `config.base_url` using `store` for credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                base_url: config.base_url.clone(),
                store,
                on_session_expired: RwLock::new(None),
                refresh: Mutex::new(None),
            }),
        })
    }

    /// Register the callback run when the session cannot be refreshed.
    ///
    /// Replaces any previously registered callback.
    pub fn set_session_expired_handler(&self, handler: SessionExpiredHandler) {
        *self
            .inner
            .on_session_expired
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Send `req` and return its envelope.
    ///
    /// # Errors
    ///
    /// - `ApiError::SessionExpired` if a 401 could not be recovered by a refresh
    /// - `ApiError::Status` for any other non-2xx response
    /// - `ApiError::Application` for a 2xx envelope with `success: false`
    /// - `ApiError::Network`, `ApiError::Timeout` or `ApiError::Decode` on
    ///   transport and parse failures
    #[instrument(skip(self, req), fields(method = %req.method, path = %req.path))]
    pub async fn request<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<ApiResponse<T>> {
        let token = self.inner.store.access_token();
        let (mut status, mut body) = self.execute(req, token.as_ref()).await?;

        if status == StatusCode::UNAUTHORIZED && req.triggers_refresh() {
            debug!("Access token rejected");
            let fresh = self.recover_session(token.as_ref()).await?;
            (status, body) = self.execute(req, Some(&fresh)).await?;
        }

        parse_envelope(&req.path, status, &body)
    }

    /// Send `req` and return its `data`.
    ///
    /// # Errors
    ///
    /// As [`Gateway::request`], plus `ApiError::MissingData` when the envelope
    /// has no `data`.
    pub async fn fetch_data<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T> {
        self.request::<T>(req)
            .await?
            .data
            .ok_or_else(|| ApiError::MissingData(req.path.clone()))
    }

    /// Send `req` and return its list `data` with pagination.
    ///
    /// # Errors
    ///
    /// As [`Gateway::request`].
    pub async fn fetch_page<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<Page<T>> {
        Ok(self.request::<Vec<T>>(req).await?.into_page())
    }

    async fn execute(
        &self,
        req: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<(StatusCode, String)> {
        let url = self.url_for(req)?;

        let mut builder = self
            .inner
            .client
            .request(req.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("X-Request-Id", Uuid::new_v4().to_string());

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Response received");

        Ok((status, body))
    }

    fn url_for(&self, req: &ApiRequest) -> Result<Url> {
        let raw = format!(
            "{}{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            req.path
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("bad path {}: {e}", req.path)))?;
        if !req.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&req.query);
        }
        Ok(url)
    }

    // =========================================================================
    // Token refresh
    // =========================================================================

    /// Obtain a usable access token after `sent` was rejected.
    async fn recover_session(&self, sent: Option<&SecretString>) -> Result<SecretString> {
        match self.inner.store.access_token() {
            Some(current)
                if sent.is_none_or(|sent| sent.expose_secret() != current.expose_secret()) =>
            {
                debug!("Access token was replaced while the request was in flight");
                return Ok(current);
            }
            None if sent.is_some() => {
                debug!("Session ended while the request was in flight");
                return Err(ApiError::SessionExpired);
            }
            _ => {}
        }

        let refresh = {
            let mut slot = self.inner.refresh.lock().await;
            match slot.as_ref() {
                Some(in_flight) if in_flight.peek().is_none() => {
                    debug!("Joining in-flight token refresh");
                    in_flight.clone()
                }
                _ => {
                    let fresh = self.refresh_future().boxed().shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let outcome = refresh.clone().await;

        let mut slot = self.inner.refresh.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&refresh)) {
            *slot = None;
        }

        outcome
    }

    /// One refresh attempt. Owns clones of everything it touches so it can be
    /// shared between waiters.
    fn refresh_future(&self) -> impl Future<Output = Result<SecretString>> + Send + 'static {
        let client = self.inner.client.clone();
        let store = Arc::clone(&self.inner.store);
        let handler = self
            .inner
            .on_session_expired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let url = self.url_for(&ApiRequest::post(REFRESH_PATH));

        async move {
            let attempt = async {
                let response = client
                    .post(url?)
                    .header(CONTENT_TYPE, "application/json")
                    .header(ACCEPT, "application/json")
                    .header("X-Request-Id", Uuid::new_v4().to_string())
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await?;
                let token = parse_auth(REFRESH_PATH, status, &body)?.0;
                store.set_access_token(token.clone())?;
                Ok::<_, ApiError>(token)
            };

            match attempt.await {
                Ok(token) => {
                    info!("Access token refreshed");
                    Ok(token)
                }
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, ending session");
                    if let Err(e) = store.clear() {
                        warn!(error = %e, "Failed to clear stored credentials");
                    }
                    if let Some(handler) = handler {
                        handler();
                    }
                    Err(ApiError::SessionExpired)
                }
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in and store the returned access token and user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Authentication` if the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User> {
        let req = ApiRequest::post(LOGIN_PATH).with_json(&serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        }))?;

        let (status, body) = self.execute(&req, None).await?;
        let (token, user) = parse_auth(LOGIN_PATH, status, &body)?;
        self.inner.store.set_access_token(token)?;

        let user = match user {
            Some(user) => user,
            None => self.me().await?,
        };
        self.inner.store.set_user(Some(user.clone()))?;

        info!(user = %user.id, "Signed in");
        Ok(user)
    }

    /// Sign out on the backend and forget the stored credentials.
    ///
    /// Local credentials are cleared even if the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns the backend or storage failure, if any.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let result = self.request::<Value>(&ApiRequest::post(LOGOUT_PATH)).await;
        self.inner.store.clear()?;
        result.map(|_| ())
    }

    /// The signed-in user according to the backend.
    ///
    /// # Errors
    ///
    /// As [`Gateway::request`].
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User> {
        self.fetch_data(&ApiRequest::get(ME_PATH)).await
    }
}

// =============================================================================
// Response parsing
// =============================================================================

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

fn status_error(path: &str, status: StatusCode, backend_message: Option<String>) -> ApiError {
    let message =
        backend_message.unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    warn!(path, status = status.as_u16(), %message, "Request failed");
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn parse_envelope<T: DeserializeOwned>(
    path: &str,
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<T>> {
    if !status.is_success() {
        let backend_message = serde_json::from_str::<ApiResponse<Value>>(body)
            .ok()
            .and_then(|envelope| envelope.message.or(envelope.error));
        return Err(status_error(path, status, backend_message));
    }

    let body = if body.trim().is_empty() {
        r#"{"success":true}"#
    } else {
        body
    };

    let envelope: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        error!(path, error = %e, body = %excerpt(body), "Failed to parse response envelope");
        ApiError::from(e)
    })?;

    if !envelope.success {
        return Err(ApiError::Application(envelope.failure_message()));
    }

    Ok(envelope)
}

/// Token and user from a login or refresh response.
fn parse_auth(
    path: &str,
    status: StatusCode,
    body: &str,
) -> Result<(SecretString, Option<User>)> {
    let parsed = serde_json::from_str::<AuthResponse>(body);

    if !status.is_success() {
        return match parsed {
            Ok(response)
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST =>
            {
                Err(ApiError::Authentication(response.failure_message()))
            }
            Ok(response) => Err(status_error(
                path,
                status,
                response.message.or(response.error),
            )),
            Err(_) => Err(status_error(path, status, None)),
        };
    }

    let response = parsed.map_err(|e| {
        error!(path, error = %e, body = %excerpt(body), "Failed to parse auth response");
        ApiError::from(e)
    })?;

    match response.token {
        Some(token) if response.success => Ok((SecretString::from(token), response.user)),
        _ => Err(ApiError::Authentication(response.failure_message())),
    }
}
