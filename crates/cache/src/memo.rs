//! The memoizing cache itself.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tracing::{debug, warn};

use crate::bucket::BucketKey;
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, PolicyError};
use crate::stats::{CacheStats, Counters};

/// Freshness window and capacity bound of a [`BucketedCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    window: Duration,
    max_entries: NonZeroUsize,
}

impl CachePolicy {
    pub fn new(window: Duration, max_entries: usize) -> Result<Self, PolicyError> {
        if window.as_secs() == 0 {
            return Err(PolicyError::ZeroWindow(window));
        }
        if window.subsec_nanos() != 0 {
            return Err(PolicyError::FractionalWindow(window));
        }
        let max_entries = NonZeroUsize::new(max_entries).ok_or(PolicyError::ZeroCapacity)?;
        Ok(Self { window, max_entries })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries.get()
    }
}

type Flight<V, E> = Shared<BoxFuture<'static, Result<V, CacheError<E>>>>;

struct Slots<K, V, E> {
    entries: LruCache<BucketKey<K>, V>,
    in_flight: HashMap<BucketKey<K>, Flight<V, E>>,
}

struct Inner<K, V, E> {
    slots: Mutex<Slots<K, V, E>>,
    counters: Counters,
}

impl<K, V, E> Inner<K, V, E>
where
    K: Hash + Eq,
{
    /// The lock is only ever held for map bookkeeping, never across an
    /// await or a computation, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slots<K, V, E>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded LRU memoizer whose entries expire by time bucket.
///
/// Cloning is cheap and clones share entries, in-flight computations and
/// counters; hand one clone to each request handler.
pub struct BucketedCache<K, V, E> {
    inner: Arc<Inner<K, V, E>>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl<K, V, E> Clone for BucketedCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            policy: self.policy,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, V, E> BucketedCache<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Create a cache driven by the wall clock.
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Slots {
                    entries: LruCache::new(policy.max_entries),
                    in_flight: HashMap::new(),
                }),
                counters: Counters::default(),
            }),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Return the value for `key` in the current bucket, computing it at
    /// most once per bucket.
    ///
    /// `compute` runs on its own tokio task and must close over whatever
    /// arguments the downstream call needs. Concurrent callers for the same
    /// key and bucket await the same computation. A failed computation is
    /// reported to every waiter of that flight and is not stored, so the
    /// next call starts afresh.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.get_or_compute_within(key, self.policy.window, compute).await
    }

    /// Like [`get_or_compute`](Self::get_or_compute) with a per-call window.
    pub async fn get_or_compute_within<F, Fut>(
        &self,
        key: K,
        window: Duration,
        compute: F,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if window.as_secs() == 0 || window.subsec_nanos() != 0 {
            return Err(CacheError::InvalidWindow);
        }
        let slot = BucketKey::new(key, window, self.clock.now());

        let flight = {
            let mut slots = self.inner.lock();

            if let Some(value) = slots.entries.get(&slot) {
                Counters::bump(&self.inner.counters.hits);
                debug!(key = ?slot.key, bucket = slot.bucket, "cache hit");
                return Ok(value.clone());
            }

            let existing = slots.in_flight.get(&slot).cloned();
            match existing {
                Some(flight) => {
                    Counters::bump(&self.inner.counters.coalesced);
                    debug!(key = ?slot.key, bucket = slot.bucket, "joining in-flight computation");
                    flight
                }
                None => {
                    Counters::bump(&self.inner.counters.misses);
                    debug!(key = ?slot.key, bucket = slot.bucket, "cache miss");
                    let flight = launch(Arc::clone(&self.inner), slot.clone(), compute);
                    slots.in_flight.insert(slot, flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Fresh value for `key` if one is stored, without computing and
    /// without touching recency.
    pub fn peek(&self, key: &K) -> Option<V> {
        let slot = BucketKey::new(key.clone(), self.policy.window, self.clock.now());
        self.inner.lock().entries.peek(&slot).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, in_flight) = {
            let slots = self.inner.lock();
            (slots.entries.len(), slots.in_flight.len())
        };
        let c = &self.inner.counters;
        CacheStats {
            hits: Counters::load(&c.hits),
            misses: Counters::load(&c.misses),
            coalesced: Counters::load(&c.coalesced),
            evictions: Counters::load(&c.evictions),
            failures: Counters::load(&c.failures),
            entries,
            in_flight,
            capacity: self.policy.max_entries(),
            window_secs: self.policy.window.as_secs(),
        }
    }
}

/// Spawn the computation for `slot` and return the shared handle waiters
/// await. The task settles the slot itself, so the result lands even if
/// every waiter has gone away.
fn launch<K, V, E, F, Fut>(inner: Arc<Inner<K, V, E>>, slot: BucketKey<K>, compute: F) -> Flight<V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    let guard = FlightGuard {
        inner: Arc::clone(&inner),
        slot: Some(slot),
    };
    let handle = tokio::spawn(async move {
        let mut guard = guard;
        let result = compute().await;
        guard.settle(&result);
        result
    });

    async move {
        match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Computation(e)),
            Err(join) => {
                Counters::bump(&inner.counters.failures);
                Err(CacheError::Aborted(join.to_string()))
            }
        }
    }
    .boxed()
    .shared()
}

/// Clears the in-flight registration of a slot exactly once, on completion
/// or, if the computation panics, on unwind.
struct FlightGuard<K, V, E>
where
    K: Hash + Eq,
{
    inner: Arc<Inner<K, V, E>>,
    slot: Option<BucketKey<K>>,
}

impl<K, V, E> FlightGuard<K, V, E>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
    E: Debug,
{
    fn settle(&mut self, result: &Result<V, E>) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let mut slots = self.inner.lock();
        slots.in_flight.remove(&slot);

        match result {
            Ok(value) => {
                if let Some((evicted, _)) = slots.entries.push(slot.clone(), value.clone()) {
                    if evicted != slot {
                        Counters::bump(&self.inner.counters.evictions);
                        debug!(key = ?evicted.key, bucket = evicted.bucket, "evicted least-recently-used entry");
                    }
                }
            }
            Err(e) => {
                Counters::bump(&self.inner.counters.failures);
                warn!(key = ?slot.key, bucket = slot.bucket, error = ?e, "computation failed; not cached");
            }
        }
    }
}

impl<K, V, E> Drop for FlightGuard<K, V, E>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.inner
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .in_flight
                .remove(&slot);
        }
    }
}
