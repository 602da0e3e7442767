//! Read-through query cache shared by the pages.
//!
//! Entries are keyed by logical query identity ([`QueryKey`]) and stay fresh
//! for a fixed window. Reads for a key that already has a request in flight
//! attach to that request instead of issuing another one. Writes never touch
//! cached values: they [`invalidate`](QueryCache::invalidate) them, which
//! marks them stale and notifies subscribers. Entries older than the window
//! are dropped on the next read or invalidation.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use api_types::page::PageRequest;
use tokio::{
    sync::{OnceCell, broadcast},
    time::Instant,
};

use crate::error::Result;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

const EVENTS_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TransactionsList(PageRequest),
    TransactionDetail(String),
    /// Aggregate maintained elsewhere; only ever invalidated from here.
    DashboardStatistics,
}

impl QueryKey {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::TransactionsList(_) => "transactions-list",
            Self::TransactionDetail(_) => "transaction-detail",
            Self::DashboardStatistics => "dashboard-statistics",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransactionsList(query) => {
                write!(
                    f,
                    "{}(page={},size={}",
                    self.operation(),
                    query.page,
                    query.size
                )?;
                if let Some(sort_by) = &query.sort_by {
                    write!(f, ",sort={sort_by}")?;
                }
                if let Some(direction) = query.sort_direction {
                    write!(f, ",dir={direction:?}")?;
                }
                f.write_str(")")
            }
            Self::TransactionDetail(id) => write!(f, "{}({id})", self.operation()),
            Self::DashboardStatistics => f.write_str(self.operation()),
        }
    }
}

/// Selects the keys an invalidation or a subscription applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyPattern {
    Exact(QueryKey),
    /// `transactions-list(*)`, whatever the page parameters.
    AllTransactionLists,
}

impl KeyPattern {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::AllTransactionLists => matches!(key, QueryKey::TransactionsList(_)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve a fresh entry if there is one.
    Cached,
    /// Skip the freshness check (manual refresh). Still joins an in-flight
    /// request for the same key.
    Force,
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
    stale: bool,
}

type Pending<V> = Arc<OnceCell<Result<V>>>;

struct Inner<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    in_flight: HashMap<QueryKey, Pending<V>>,
}

pub struct QueryCache<V> {
    inner: Mutex<Inner<V>>,
    stale_after: Duration,
    /// One message per `invalidate` call, listing every key it touched.
    events: broadcast::Sender<Arc<[QueryKey]>>,
}

impl<V> fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

impl<V: Clone + Send + Sync> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}

impl<V: Clone + Send + Sync> QueryCache<V> {
    pub fn new(stale_after: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            }),
            stale_after,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &Entry<V>, now: Instant) -> bool {
        !entry.stale && self.within_window(entry, now)
    }

    fn within_window(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) < self.stale_after
    }

    /// Drops entries that outlived the freshness window.
    fn sweep(&self, inner: &mut Inner<V>, now: Instant) {
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| self.within_window(entry, now));
        let dropped = before - inner.entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped expired cache entries");
        }
    }

    /// Number of entries held, fresh or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns the cached value for `key` if it is still fresh.
    pub fn get(&self, key: &QueryKey) -> Option<V> {
        let now = Instant::now();
        let inner = self.lock();
        inner
            .entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.value.clone())
    }

    /// Returns the cached value for `key` even if it went stale.
    pub fn peek(&self, key: &QueryKey) -> Option<V> {
        self.lock().entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: QueryKey, value: V, at: Instant) {
        self.lock().entries.insert(
            key,
            Entry {
                value,
                fetched_at: at,
                stale: false,
            },
        );
    }

    /// Marks every entry matching `pattern` stale and notifies subscribers
    /// once with all touched keys.
    ///
    /// Requests in flight for a matching key are detached: their waiters still
    /// get the answer, but later reads start a new request. Nothing is
    /// refetched here. Returns the number of keys touched.
    pub fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let mut touched = Vec::new();
        {
            let mut inner = self.lock();
            self.sweep(&mut inner, Instant::now());
            for (key, entry) in inner.entries.iter_mut() {
                if pattern.matches(key) {
                    entry.stale = true;
                    touched.push(key.clone());
                }
            }

            let detached = inner
                .in_flight
                .keys()
                .filter(|key| pattern.matches(key))
                .cloned()
                .collect::<Vec<_>>();
            for key in detached {
                inner.in_flight.remove(&key);
                if !touched.contains(&key) {
                    touched.push(key);
                }
            }
        }

        let count = touched.len();
        tracing::info!(?pattern, count, "invalidated cache keys");
        if count > 0 {
            // No receivers is fine: nothing is mounted.
            let _ = self.events.send(touched.into());
        }
        count
    }

    /// Subscribes to invalidations of one key.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        self.subscribe_matching(KeyPattern::Exact(key))
    }

    pub fn subscribe_matching(&self, pattern: KeyPattern) -> Subscription {
        Subscription {
            pattern,
            events: self.events.subscribe(),
        }
    }

    /// Reads `key` through the cache.
    ///
    /// A fresh entry is returned as is (unless `mode` is [`FetchMode::Force`]).
    /// Otherwise the read joins the request in flight for `key`, or becomes
    /// that request by running `loader`. A failed load leaves the previous
    /// entry untouched.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, mode: FetchMode, loader: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let pending = {
            let mut inner = self.lock();
            let now = Instant::now();
            self.sweep(&mut inner, now);
            if mode == FetchMode::Cached {
                if let Some(entry) = inner.entries.get(&key).filter(|e| self.is_fresh(e, now)) {
                    tracing::debug!(%key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }
            let existing = inner.in_flight.get(&key).cloned();
            match existing {
                Some(pending) => {
                    tracing::debug!(%key, "joining in-flight request");
                    pending
                }
                None => {
                    let pending: Pending<V> = Arc::new(OnceCell::new());
                    inner.in_flight.insert(key.clone(), Arc::clone(&pending));
                    pending
                }
            }
        };

        let key_ref = &key;
        let pending_ref = &pending;
        let result = pending
            .get_or_init(move || async move {
                tracing::debug!(key = %key_ref, "fetching");
                let result = loader().await;
                self.settle(key_ref, pending_ref, &result);
                result
            })
            .await;
        result.clone()
    }

    fn settle(&self, key: &QueryKey, pending: &Pending<V>, result: &Result<V>) {
        let mut inner = self.lock();
        let current = inner
            .in_flight
            .get(key)
            .is_some_and(|registered| Arc::ptr_eq(registered, pending));
        if current {
            inner.in_flight.remove(key);
        }

        let Ok(value) = result else {
            return;
        };
        if current {
            inner.entries.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    stale: false,
                },
            );
        } else if !inner.entries.contains_key(key) {
            // Invalidated while in flight: keep it, but never as fresh data.
            inner.entries.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    stale: true,
                },
            );
        }
    }
}

/// Receives invalidations for the keys matching a pattern.
pub struct Subscription {
    pattern: KeyPattern,
    events: broadcast::Receiver<Arc<[QueryKey]>>,
}

impl Subscription {
    /// Waits for the next invalidation touching the pattern and returns the
    /// first matching key. One invalidation wakes the subscriber once, however
    /// many of its keys match.
    ///
    /// Returns `None` once the cache is gone. If events were missed the
    /// pattern itself is reported when it names a single key.
    pub async fn next(&mut self) -> Option<QueryKey> {
        loop {
            match self.events.recv().await {
                Ok(keys) => {
                    if let Some(key) = keys.iter().find(|key| self.pattern.matches(key)) {
                        return Some(key.clone());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "cache subscription lagged");
                    if let KeyPattern::Exact(key) = &self.pattern {
                        return Some(key.clone());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
