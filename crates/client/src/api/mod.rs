//! Resource operations for the Lampstand backend.
//!
//! [`ApiClient`] is the single entry point for application code. Reads go
//! through the query cache; writes go straight to the backend and, once they
//! succeed, drop the cached reads they affect before returning.
//!
//! Operations are grouped by resource in the submodules, each adding an
//! `impl ApiClient` block.

mod admin;
mod auth;
mod dashboard;
mod messages;
pub mod params;
mod questions;
mod topics;

use std::future::Future;
use std::sync::Arc;

use lampstand_core::{ThreadId, User};
use tracing::debug;

use crate::cache::{Cacheable, MutationKind, QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::session::CredentialStore;

/// Data-access client: gateway, credentials and query cache.
///
/// Cheap to clone; clones share the cache, the credential store and the HTTP
/// connection pool. Construct one per application and hand it to whatever
/// needs data.
#[derive(Clone, Debug)]
pub struct ApiClient {
    gateway: Gateway,
    cache: QueryCache,
}

impl ApiClient {
    /// Create a client for `config` with credentials kept in `store`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self {
            gateway: Gateway::new(config, store)?,
            cache: QueryCache::new(config.cache_capacity, config.staleness),
        })
    }

    /// Run `handler` whenever the session expires and cannot be refreshed.
    ///
    /// Stored credentials are already cleared when it runs.
    pub fn on_session_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.gateway.set_session_expired_handler(Arc::new(handler));
    }

    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Whether an access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.gateway.store().access_token().is_some()
    }

    /// The signed-in user as of the last login.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.gateway.store().user()
    }

    // =========================================================================
    // Query / mutation plumbing
    // =========================================================================

    async fn query<T, F>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>>
    where
        T: Cacheable,
        F: Future<Output = Result<T>>,
    {
        self.cache.get_or_fetch(key, fetch).await
    }

    /// Run a write and, if it succeeds, invalidate what it affects.
    async fn mutate<R>(
        &self,
        kind: MutationKind,
        write: impl Future<Output = Result<R>>,
    ) -> Result<R> {
        self.mutate_in_thread(kind, write, |_| None).await
    }

    /// Like [`Self::mutate`], resolving the affected thread from the result.
    async fn mutate_in_thread<R>(
        &self,
        kind: MutationKind,
        write: impl Future<Output = Result<R>>,
        thread_of: impl FnOnce(&R) -> Option<ThreadId>,
    ) -> Result<R> {
        match write.await {
            Ok(value) => {
                let thread = thread_of(&value);
                self.cache.invalidate(kind.invalidates(), thread.as_ref());
                Ok(value)
            }
            Err(e) => {
                debug!(?kind, error = %e, "Mutation failed, cache left intact");
                Err(e)
            }
        }
    }
}

/// Path segment for an id.
fn segment(id: &impl AsRef<str>) -> String {
    url::form_urlencoded::byte_serialize(id.as_ref().as_bytes()).collect()
}
