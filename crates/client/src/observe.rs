//! Observable query and mutation state for UI layers.
//!
//! A [`Query`] wraps one read and publishes its loading/data/error state on a
//! `tokio::sync::watch` channel; a [`Mutation`] does the same for one write.
//! Both delegate to [`ApiClient`] operations, so caching and invalidation
//! behave exactly as for direct calls.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::cache::QueryFamily;
use crate::error::{ApiError, Result};

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<T>>> + Send + Sync>;
type Runner<P, R> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<R>> + Send + Sync>;

// =============================================================================
// Query
// =============================================================================

/// Snapshot of a query.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    /// Error of the latest fetch; cleared by the next success.
    pub error: Option<ApiError>,
    pub is_loading: bool,
    pub fetched_at: Option<Instant>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            fetched_at: None,
        }
    }
}

/// One observable read.
pub struct Query<T> {
    fetcher: Fetcher<T>,
    state: watch::Sender<QueryState<T>>,
    stale_after: Duration,
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn new<F, Fut>(stale_after: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>>> + Send + 'static,
    {
        Self {
            fetcher: Arc::new(move || fetch().boxed()),
            state: watch::channel(QueryState::default()).0,
            stale_after,
        }
    }

    /// Run the read and publish its outcome.
    ///
    /// # Errors
    ///
    /// Returns the read's failure, which is also published as state.
    pub async fn fetch(&self) -> Result<Arc<T>> {
        self.state.send_modify(|state| state.is_loading = true);

        let result = (self.fetcher)().await;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match &result {
                Ok(data) => {
                    state.data = Some(Arc::clone(data));
                    state.error = None;
                    state.fetched_at = Some(Instant::now());
                }
                Err(e) => state.error = Some(e.clone()),
            }
        });

        result
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Whether the data is missing or older than the staleness window.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state
            .borrow()
            .fetched_at
            .is_none_or(|at| at.elapsed() >= self.stale_after)
    }
}

// =============================================================================
// Mutation
// =============================================================================

/// Snapshot of a mutation.
#[derive(Debug, Clone, Default)]
pub struct MutationState {
    pub is_pending: bool,
    /// Error of the latest execution; cleared by the next success.
    pub error: Option<ApiError>,
}

/// One observable write.
pub struct Mutation<P, R> {
    runner: Runner<P, R>,
    state: watch::Sender<MutationState>,
}

impl<P, R> std::fmt::Debug for Mutation<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<P: Send + 'static, R: Send + 'static> Mutation<P, R> {
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        Self {
            runner: Arc::new(move |params| run(params).boxed()),
            state: watch::channel(MutationState::default()).0,
        }
    }

    /// Run the write with `params`.
    ///
    /// # Errors
    ///
    /// Returns the write's failure, which is also published as state.
    pub async fn execute(&self, params: P) -> Result<R> {
        self.state.send_modify(|state| state.is_pending = true);

        let result = (self.runner)(params).await;

        self.state.send_modify(|state| {
            state.is_pending = false;
            state.error = result.as_ref().err().cloned();
        });

        result
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending
    }

    #[must_use]
    pub fn last_error(&self) -> Option<ApiError> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }
}

// =============================================================================
// ApiClient helpers
// =============================================================================

impl ApiClient {
    /// Observable read over a client operation, stale after the family's
    /// window.
    ///
    /// ```ignore
    /// let topics = client.observe(QueryFamily::Topics, |client| async move {
    ///     client.topics(&TopicListParams::default()).await
    /// });
    /// ```
    pub fn observe<T, F, Fut>(&self, family: QueryFamily, read: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Self) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>>> + Send + 'static,
    {
        let client = self.clone();
        Query::new(self.cache().staleness().window_for(family), move || {
            read(client.clone())
        })
    }

    /// Observable write over a client operation.
    pub fn mutation<P, R, F, Fut>(&self, write: F) -> Mutation<P, R>
    where
        P: Send + 'static,
        R: Send + 'static,
        F: Fn(Self, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        let client = self.clone();
        Mutation::new(move |params| write(client.clone(), params))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_query_publishes_data() {
        let query = Query::new(Duration::from_secs(60), || async {
            Ok::<_, ApiError>(Arc::new(42_u32))
        });
        let mut rx = query.subscribe();
        assert!(query.is_stale());

        let value = query.fetch().await.unwrap();
        assert_eq!(*value, 42);

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.data.as_deref(), Some(&42));
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(!query.is_stale());
    }

    #[tokio::test]
    async fn test_query_error_keeps_previous_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = Query::new(Duration::from_secs(60), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok::<_, ApiError>(Arc::new("first".to_string()))
                } else {
                    Err(ApiError::Timeout)
                }
            }
        });

        query.fetch().await.unwrap();
        assert_eq!(query.fetch().await.unwrap_err(), ApiError::Timeout);

        let state = query.state();
        assert_eq!(state.data.as_deref().map(String::as_str), Some("first"));
        assert_eq!(state.error, Some(ApiError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_goes_stale() {
        let query = Query::new(Duration::from_millis(20), || async {
            Ok::<_, ApiError>(Arc::new(()))
        });
        query.fetch().await.unwrap();
        assert!(!query.is_stale());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(query.is_stale());
    }

    #[tokio::test]
    async fn test_mutation_tracks_error() {
        let mutation = Mutation::new(|n: u32| async move {
            if n > 0 {
                Ok::<_, ApiError>(n * 2)
            } else {
                Err(ApiError::Application("must be positive".to_string()))
            }
        });

        assert!(mutation.execute(0).await.is_err());
        assert!(!mutation.is_pending());
        assert_eq!(
            mutation.last_error(),
            Some(ApiError::Application("must be positive".to_string()))
        );

        assert_eq!(mutation.execute(4).await.unwrap(), 8);
        assert!(mutation.last_error().is_none());
    }
}
