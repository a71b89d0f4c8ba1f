//! Query cache for read results.
//!
//! Results are keyed by [`QueryKey`] (resource family, optional scope such as
//! a thread id, and the canonical JSON of the request parameters) and held in a
//! `moka` future cache. Each family has its own staleness window; an entry
//! older than its window is never served and is refetched on the next read.
//!
//! Concurrent cold reads of the same key share a single fetch. A failed fetch
//! stores nothing, so the next read tries again.
//!
//! Every key also carries the generation of its family (and scope) at the
//! moment the read started. Invalidation bumps the generation before it
//! returns, so a read issued afterwards never joins a fetch that began before
//! the write, and whatever that older fetch stores is unreachable.

mod invalidation;

pub use invalidation::{Invalidation, MutationKind};

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lampstand_core::{
    Activity, AdminAnswerView, AdminQuestionView, DashboardStats, Message, Page, Question,
    ThreadId, ThreadNode, Topic,
};
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

// =============================================================================
// Keys
// =============================================================================

/// Resource families. Invalidation works at this granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Topics,
    Topic,
    AdminTopics,
    Questions,
    Question,
    AdminQuestions,
    AdminAnswers,
    Messages,
    Conversations,
    Thread,
    DashboardStats,
    RecentActivity,
}

/// Cache key for one read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub family: QueryFamily,
    /// Narrower target within the family (the thread id for thread reads).
    pub scope: Option<String>,
    /// Canonical JSON of the request parameters.
    pub params: String,
    /// Invalidation generation, stamped by the cache on lookup.
    generation: u64,
}

impl QueryKey {
    /// Key for a family read with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the parameters cannot be serialized.
    pub fn new(family: QueryFamily, params: &impl Serialize) -> Result<Self> {
        let params = serde_json::to_string(params)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable parameters: {e}")))?;
        Ok(Self {
            family,
            scope: None,
            params,
            generation: 0,
        })
    }

    /// Key for a read scoped to one entity, with no further parameters.
    #[must_use]
    pub fn scoped(family: QueryFamily, scope: impl Into<String>) -> Self {
        Self {
            family,
            scope: Some(scope.into()),
            params: String::new(),
            generation: 0,
        }
    }

    /// Key for one thread.
    #[must_use]
    pub fn thread(id: &ThreadId) -> Self {
        Self::scoped(QueryFamily::Thread, id.as_str())
    }
}

// =============================================================================
// Staleness
// =============================================================================

/// How long a cached result stays fresh, per kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessConfig {
    /// Dashboard statistics
    pub dashboard: Duration,
    /// Recent activity feed
    pub activity: Duration,
    /// Topic, question and answer lists (public and admin)
    pub lists: Duration,
    /// Single topic or question
    pub detail: Duration,
    /// Message lists, conversations and threads
    pub messages: Duration,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            dashboard: Duration::from_secs(60),
            activity: Duration::from_secs(60),
            lists: Duration::from_secs(180),
            detail: Duration::from_secs(120),
            messages: Duration::from_secs(60),
        }
    }
}

impl StalenessConfig {
    /// The same window for every family. Mostly useful in tests.
    #[must_use]
    pub const fn uniform(window: Duration) -> Self {
        Self {
            dashboard: window,
            activity: window,
            lists: window,
            detail: window,
            messages: window,
        }
    }

    #[must_use]
    pub const fn window_for(&self, family: QueryFamily) -> Duration {
        match family {
            QueryFamily::DashboardStats => self.dashboard,
            QueryFamily::RecentActivity => self.activity,
            QueryFamily::Topics
            | QueryFamily::AdminTopics
            | QueryFamily::Questions
            | QueryFamily::AdminQuestions
            | QueryFamily::AdminAnswers => self.lists,
            QueryFamily::Topic | QueryFamily::Question => self.detail,
            QueryFamily::Messages | QueryFamily::Conversations | QueryFamily::Thread => {
                self.messages
            }
        }
    }
}

struct FamilyExpiry(StalenessConfig);

impl Expiry<QueryKey, CachedValue> for FamilyExpiry {
    fn expire_after_create(
        &self,
        key: &QueryKey,
        _value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.0.window_for(key.family))
    }
}

// =============================================================================
// Values
// =============================================================================

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Topics(Arc<Page<Topic>>),
    Topic(Arc<Topic>),
    Questions(Arc<Page<Question>>),
    Question(Arc<Question>),
    AdminQuestions(Arc<Page<AdminQuestionView>>),
    AdminAnswers(Arc<Page<AdminAnswerView>>),
    Messages(Arc<Page<Message>>),
    Threads(Arc<Vec<ThreadNode>>),
    Thread(Arc<ThreadNode>),
    DashboardStats(Arc<DashboardStats>),
    Activity(Arc<Vec<Activity>>),
}

/// Types that can be stored in the query cache.
pub trait Cacheable: Send + Sync + Sized + 'static {
    fn into_cached(value: Arc<Self>) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Arc<Self>>;
}

macro_rules! cacheable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Cacheable for $ty {
                fn into_cached(value: Arc<Self>) -> CachedValue {
                    CachedValue::$variant(value)
                }

                fn from_cached(value: CachedValue) -> Option<Arc<Self>> {
                    match value {
                        CachedValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

cacheable! {
    Page<Topic> => Topics,
    Topic => Topic,
    Page<Question> => Questions,
    Question => Question,
    Page<AdminQuestionView> => AdminQuestions,
    Page<AdminAnswerView> => AdminAnswers,
    Page<Message> => Messages,
    Vec<ThreadNode> => Threads,
    ThreadNode => Thread,
    DashboardStats => DashboardStats,
    Vec<Activity> => Activity,
}

// =============================================================================
// Generations
// =============================================================================

/// Invalidation counters. A key's generation is the sum of the global epoch,
/// its family counter and its scope counter; each only grows.
#[derive(Debug, Default)]
struct Generations {
    epoch: u64,
    slots: HashMap<(QueryFamily, Option<String>), u64>,
}

impl Generations {
    fn current(&self, family: QueryFamily, scope: Option<&str>) -> u64 {
        let family_gen = self.slots.get(&(family, None)).copied().unwrap_or(0);
        let scope_gen = scope
            .and_then(|scope| self.slots.get(&(family, Some(scope.to_string()))))
            .copied()
            .unwrap_or(0);
        self.epoch + family_gen + scope_gen
    }

    fn bump(&mut self, family: QueryFamily, scope: Option<String>) {
        *self.slots.entry((family, scope)).or_default() += 1;
    }
}

// =============================================================================
// QueryCache
// =============================================================================

/// Shared cache of read results.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, CachedValue>,
    staleness: StalenessConfig,
    generations: Arc<Mutex<Generations>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new(capacity: u64, staleness: StalenessConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(FamilyExpiry(staleness))
            .support_invalidation_closures()
            .build();
        Self {
            inner,
            staleness,
            generations: Arc::default(),
        }
    }

    fn generations(&self) -> MutexGuard<'_, Generations> {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `key` as of the current generation of its family and scope.
    fn stamp(&self, mut key: QueryKey) -> QueryKey {
        key.generation = self
            .generations()
            .current(key.family, key.scope.as_deref());
        key
    }

    #[must_use]
    pub const fn staleness(&self) -> &StalenessConfig {
        &self.staleness
    }

    /// Return the fresh cached result for `key`, or run `fetch` and cache its
    /// success.
    ///
    /// Concurrent callers for the same cold key await one shared `fetch`; all
    /// of them see its outcome. Errors are not cached. A caller arriving after
    /// an invalidation of the key's family starts its own fetch.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `fetch`.
    pub async fn get_or_fetch<T, F>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>>
    where
        T: Cacheable,
        F: Future<Output = Result<T>>,
    {
        let family = key.family;
        let entry = self
            .inner
            .entry(self.stamp(key))
            .or_try_insert_with(async move {
                fetch
                    .await
                    .map(|value| T::into_cached(Arc::new(value)))
            })
            .await
            .map_err(|e: Arc<ApiError>| (*e).clone())?;

        if entry.is_fresh() {
            debug!(?family, "Cache miss, stored fetched result");
        } else {
            debug!(?family, "Cache hit");
        }

        T::from_cached(entry.into_value()).ok_or_else(|| {
            warn!(?family, "Cached value has unexpected type");
            ApiError::Decode(format!("cached {family:?} entry has unexpected type"))
        })
    }

    /// Fresh cached result for `key`, without fetching.
    pub async fn peek<T: Cacheable>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.inner
            .get(&self.stamp(key.clone()))
            .await
            .and_then(T::from_cached)
    }

    /// Drop the targets of a successful mutation.
    ///
    /// `thread` names the thread the mutated message belongs to; without it an
    /// [`Invalidation::AffectedThread`] target drops every cached thread.
    pub fn invalidate(&self, targets: &[Invalidation], thread: Option<&ThreadId>) {
        let mut families = Vec::with_capacity(targets.len());
        let mut all_threads = false;
        let mut scoped_thread = None;

        for target in targets {
            match target {
                Invalidation::Family(family) => families.push(*family),
                Invalidation::AffectedThread => match thread {
                    Some(id) => scoped_thread = Some(id.as_str().to_string()),
                    None => all_threads = true,
                },
            }
        }

        if all_threads {
            families.push(QueryFamily::Thread);
        }

        debug!(?families, thread = ?scoped_thread, "Invalidating cached queries");

        {
            let mut generations = self.generations();
            for family in &families {
                generations.bump(*family, None);
            }
            if let Some(id) = &scoped_thread {
                generations.bump(QueryFamily::Thread, Some(id.clone()));
            }
        }

        let result = self.inner.invalidate_entries_if(move |key, _| {
            families.contains(&key.family)
                || (key.family == QueryFamily::Thread
                    && scoped_thread.is_some()
                    && key.scope == scoped_thread)
        });

        if let Err(e) = result {
            warn!(error = %e, "Selective invalidation unavailable, clearing cache");
            self.inner.invalidate_all();
        }
    }

    /// Drop every entry of one family.
    pub fn invalidate_family(&self, family: QueryFamily) {
        self.invalidate(&[Invalidation::Family(family)], None);
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.generations().epoch += 1;
        self.inner.invalidate_all();
    }

    /// Flush pending maintenance so `entry_count` is exact.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
