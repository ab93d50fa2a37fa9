//! Synchronization layer
//!
//! Keeps one cached, versioned view per query key (a resource kind plus an
//! optional namespace filter). While at least one [`LiveView`] observes a key a
//! background task refreshes it on a fixed interval, and immediately when its
//! kind is invalidated. The task stops once the last view is dropped; the
//! cached state stays around for the next subscriber.
//!
//! A failed poll never clears what was last fetched: the previous items stay
//! visible and the failure is attached next to them.

use crate::error::{ApiResult, SyncClosed};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Resource collections the console keeps in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Workloads,
    Endpoints,
    Pods,
    Namespaces,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Workloads,
        ResourceKind::Endpoints,
        ResourceKind::Pods,
        ResourceKind::Namespaces,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workloads => write!(f, "deployments"),
            Self::Endpoints => write!(f, "services"),
            Self::Pods => write!(f, "pods"),
            Self::Namespaces => write!(f, "namespaces"),
        }
    }
}

/// Identity of a cached collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
}

impl QueryKey {
    /// An empty namespace means "all namespaces"
    pub fn new(kind: ResourceKind, namespace: Option<&str>) -> Self {
        Self {
            kind,
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
        }
    }

    pub fn all(kind: ResourceKind) -> Self {
        Self::new(kind, None)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}@{}", self.kind, ns),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Polling cadence and retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub pods_interval: Duration,
    pub workloads_interval: Duration,
    pub endpoints_interval: Duration,
    pub namespaces_interval: Duration,
    /// Extra attempts after a failed fetch, per poll
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pods_interval: Duration::from_millis(3000),
            workloads_interval: Duration::from_millis(5000),
            endpoints_interval: Duration::from_millis(5000),
            namespaces_interval: Duration::from_millis(30000),
            retries: 1,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl SyncConfig {
    pub fn interval_for(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::Pods => self.pods_interval,
            ResourceKind::Workloads => self.workloads_interval,
            ResourceKind::Endpoints => self.endpoints_interval,
            ResourceKind::Namespaces => self.namespaces_interval,
        }
    }
}

/// What a view can render right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing fetched yet
    Loading,
    /// Nothing fetched and the last attempt failed
    Failed,
    /// Showing earlier items; the last refresh failed
    Stale,
    Fresh,
}

/// Cached state of one query key
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<Vec<T>>,
    /// Bumped on every successful fetch
    pub version: u64,
    pub error: Option<String>,
    pub fetching: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            version: 0,
            error: None,
            fetching: false,
            updated_at: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn status(&self) -> ViewStatus {
        match (&self.data, &self.error) {
            (None, None) => ViewStatus::Loading,
            (None, Some(_)) => ViewStatus::Failed,
            (Some(_), Some(_)) => ViewStatus::Stale,
            (Some(_), None) => ViewStatus::Fresh,
        }
    }

    pub fn items(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// A fetch has completed at least once, successfully or not
    pub fn is_settled(&self) -> bool {
        !self.fetching && self.status() != ViewStatus::Loading
    }

    fn resolve(&mut self, items: Vec<T>) {
        self.data = Some(items);
        self.version += 1;
        self.error = None;
        self.fetching = false;
        self.updated_at = Some(Utc::now());
    }

    fn reject(&mut self, error: String) {
        self.error = Some(error);
        self.fetching = false;
    }
}

/// Fetches the full collection for one key
pub type Source<T> = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<Vec<T>>> + Send + Sync>;

/// Wrap an async closure as a [`Source`]
pub fn source_fn<T, F, Fut>(f: F) -> Source<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Vec<T>>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

struct Slot<T> {
    tx: watch::Sender<QueryState<T>>,
    polling: AtomicBool,
    /// Invalidation generation the latest fetch started under
    fetched: AtomicU64,
}

impl<T> Slot<T> {
    fn new(generation: u64) -> Self {
        let (tx, _) = watch::channel(QueryState::default());
        Self {
            tx,
            polling: AtomicBool::new(false),
            fetched: AtomicU64::new(generation),
        }
    }

    /// Hold back `settled` until a refetch lands
    fn mark_stale(&self) {
        self.tx.send_if_modified(|state| {
            if state.fetching {
                false
            } else {
                state.fetching = true;
                true
            }
        });
    }
}

/// Type-erased cache slot
trait CacheEntry: Send + Sync {
    fn reset(&self);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + Sync + 'static> CacheEntry for Slot<T> {
    fn reset(&self) {
        self.tx.send_replace(QueryState::default());
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct SyncInner {
    config: SyncConfig,
    slots: Mutex<HashMap<QueryKey, Arc<dyn CacheEntry>>>,
    invalidations: HashMap<ResourceKind, watch::Sender<u64>>,
    /// Bumped by `clear`; fetches begun under an older epoch are dropped
    epoch: AtomicU64,
}

impl SyncInner {
    fn generation(&self, kind: ResourceKind) -> u64 {
        self.invalidations.get(&kind).map(|tx| *tx.borrow()).unwrap_or_default()
    }
}

/// Shared cache of resource collections
#[derive(Clone)]
pub struct ResourceSync {
    inner: Arc<SyncInner>,
}

impl ResourceSync {
    pub fn new(config: SyncConfig) -> Self {
        let invalidations = ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, watch::channel(0u64).0))
            .collect();

        Self {
            inner: Arc::new(SyncInner {
                config,
                slots: Mutex::new(HashMap::new()),
                invalidations,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Observe `key`, starting its poller if nobody was watching it
    ///
    /// The returned view immediately carries whatever is cached for the key.
    pub async fn subscribe<T>(&self, key: QueryKey, source: Source<T>) -> LiveView<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut slots = self.inner.slots.lock().await;
        let generation = self.inner.generation(key.kind);

        let existing = slots
            .get(&key)
            .cloned()
            .map(|entry| entry.into_any().downcast::<Slot<T>>());

        let slot = match existing {
            Some(Ok(slot)) => slot,
            other => {
                if matches!(other, Some(Err(_))) {
                    warn!(key = %key, "replacing cache entry holding another item type");
                }
                let slot = Arc::new(Slot::<T>::new(generation));
                slots.insert(key.clone(), slot.clone());
                slot
            }
        };

        // Cached items predate an invalidation of this kind
        if slot.fetched.load(Ordering::SeqCst) != generation {
            debug!(key = %key, "cached state is stale");
            slot.mark_stale();
        }

        let rx = slot.tx.subscribe();

        if !slot.polling.swap(true, Ordering::SeqCst) {
            debug!(key = %key, "starting poller");
            tokio::spawn(poll(self.inner.clone(), key.clone(), slot, source));
        }

        LiveView { key, rx }
    }

    /// Mark every cached collection of `kind` stale; live pollers refetch now
    pub fn invalidate(&self, kind: ResourceKind) {
        if let Some(tx) = self.inner.invalidations.get(&kind) {
            tx.send_modify(|generation| *generation += 1);
            debug!(kind = %kind, "invalidated");
        }
    }

    /// Current cached state for `key`, if it was ever subscribed with `T`
    pub async fn snapshot<T>(&self, key: &QueryKey) -> Option<QueryState<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.inner.slots.lock().await.get(key).cloned()?;
        let slot = entry.into_any().downcast::<Slot<T>>().ok()?;
        let state = slot.tx.borrow().clone();
        Some(state)
    }

    /// Drop every cached collection (session teardown)
    pub async fn clear(&self) {
        let slots = self.inner.slots.lock().await;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        for entry in slots.values() {
            entry.reset();
        }
        debug!(entries = slots.len(), "cache cleared");
    }
}

async fn poll<T>(inner: Arc<SyncInner>, key: QueryKey, slot: Arc<Slot<T>>, source: Source<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let interval = inner.config.interval_for(key.kind);
    let Some(mut invalidated) = inner.invalidations.get(&key.kind).map(|tx| tx.subscribe()) else {
        slot.polling.store(false, Ordering::SeqCst);
        return;
    };

    loop {
        let generation = *invalidated.borrow_and_update();
        slot.fetched.store(generation, Ordering::SeqCst);
        let epoch = inner.epoch.load(Ordering::SeqCst);
        slot.tx.send_modify(|state| state.fetching = true);

        let result = fetch_with_retry(&inner.config, &key, &source).await;

        // Checked under the channel lock so a concurrent `clear` cannot be undone
        let mut current = true;
        slot.tx.send_if_modified(|state| {
            if inner.epoch.load(Ordering::SeqCst) != epoch {
                current = false;
                return false;
            }
            match result {
                Ok(items) => state.resolve(items),
                Err(error) => state.reject(error),
            }
            true
        });
        if !current {
            debug!(key = %key, "dropping result fetched before the cache was cleared");
            continue;
        }

        // Invalidated while the fetch was in flight
        if invalidated.has_changed().unwrap_or(false) {
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = invalidated.changed() => {
                debug!(key = %key, "refetching after invalidation");
            }
            _ = slot.tx.closed() => {
                if release(&inner, &key, &slot).await {
                    return;
                }
            }
        }
    }
}

/// Stop polling unless a view subscribed in the meantime
async fn release<T>(inner: &SyncInner, key: &QueryKey, slot: &Slot<T>) -> bool {
    let _slots = inner.slots.lock().await;
    if slot.tx.receiver_count() > 0 {
        return false;
    }
    slot.polling.store(false, Ordering::SeqCst);
    debug!(key = %key, "no observers left, poller stopped");
    true
}

async fn fetch_with_retry<T>(config: &SyncConfig, key: &QueryKey, source: &Source<T>) -> Result<Vec<T>, String> {
    let mut attempt = 0;
    loop {
        match source().await {
            Ok(items) => {
                debug!(key = %key, count = items.len(), "poll succeeded");
                return Ok(items);
            }
            Err(error) if attempt < config.retries && error.is_retryable() => {
                attempt += 1;
                warn!(key = %key, attempt, error = %error, "poll failed, retrying");
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(error) => {
                warn!(key = %key, error = %error, "poll failed");
                return Err(error.user_message(&format!("Failed to fetch {}", key.kind)));
            }
        }
    }
}

/// Live handle on a cached collection; polling continues while any exists
pub struct LiveView<T> {
    key: QueryKey,
    rx: watch::Receiver<QueryState<T>>,
}

impl<T: Clone> LiveView<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn snapshot(&self) -> QueryState<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next update
    pub async fn changed(&mut self) -> Result<QueryState<T>, SyncClosed> {
        self.rx.changed().await.map_err(|_| SyncClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until the cached state satisfies `predicate`, checking the current
    /// state first
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&QueryState<T>) -> bool,
    ) -> Result<QueryState<T>, SyncClosed> {
        let state = self.rx.wait_for(predicate).await.map_err(|_| SyncClosed)?;
        Ok(state.clone())
    }

    /// Wait for the first completed fetch
    pub async fn settled(&mut self) -> Result<QueryState<T>, SyncClosed> {
        self.wait_for(|state| state.is_settled()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_view_status() {
        let mut state: QueryState<u32> = QueryState::default();
        assert_eq!(state.status(), ViewStatus::Loading);
        assert!(state.items().is_empty());

        state.reject("boom".to_string());
        assert_eq!(state.status(), ViewStatus::Failed);

        state.resolve(vec![1, 2]);
        assert_eq!(state.status(), ViewStatus::Fresh);
        assert_eq!(state.version, 1);

        state.reject("boom".to_string());
        assert_eq!(state.status(), ViewStatus::Stale);
        assert_eq!(state.items(), &[1, 2]);
        assert_eq!(state.version, 1);
    }

    #[test]
    fn test_query_key_normalizes_empty_namespace() {
        assert_eq!(QueryKey::new(ResourceKind::Pods, Some("")), QueryKey::all(ResourceKind::Pods));
        assert_eq!(QueryKey::new(ResourceKind::Pods, Some("shop")).to_string(), "pods@shop");
    }

    #[test]
    fn test_default_cadence() {
        let config = SyncConfig::default();
        assert_eq!(config.interval_for(ResourceKind::Pods), Duration::from_secs(3));
        assert_eq!(config.interval_for(ResourceKind::Workloads), Duration::from_secs(5));
        assert_eq!(config.retries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_drops_fetch_in_flight() {
        let calls = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = calls.clone();
        let source: Source<u32> = source_fn(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(vec![n])
            }
        });

        let sync = ResourceSync::new(SyncConfig::default());
        let mut view = sync.subscribe(QueryKey::all(ResourceKind::Workloads), source).await;
        assert_eq!(view.settled().await.unwrap().items(), &[1]);

        // Second fetch is in flight when the cache is cleared
        sync.invalidate(ResourceKind::Workloads);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(view.snapshot().fetching);
        sync.clear().await;

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(view.snapshot().data.is_none());

        let state = view.settled().await.unwrap();
        assert_eq!(state.items(), &[3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_after_invalidation_is_not_settled() {
        let source: Source<u32> = source_fn(|| async { Ok(vec![1, 2]) });
        let sync = ResourceSync::new(SyncConfig::default());
        let key = QueryKey::all(ResourceKind::Pods);

        let mut view = sync.subscribe(key.clone(), source.clone()).await;
        view.settled().await.unwrap();
        drop(view);
        tokio::time::sleep(Duration::from_secs(10)).await;

        sync.invalidate(ResourceKind::Pods);
        let view = sync.subscribe(key, source).await;
        let state = view.snapshot();
        assert_eq!(state.items(), &[1, 2]);
        assert!(!state.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_poll_is_not_retried() {
        let calls = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = calls.clone();
        let source: Source<u32> = source_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::unauthorized("Invalid token")) }
        });

        let sync = ResourceSync::new(SyncConfig::default());
        let mut view = sync.subscribe(QueryKey::all(ResourceKind::Pods), source).await;
        let state = view.settled().await.unwrap();

        assert_eq!(state.status(), ViewStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Invalid token"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
