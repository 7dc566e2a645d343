//! Behavioural tests for the bucketed cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::{BucketedCache, CacheError, CachePolicy, ManualClock, PolicyError};

type TestCache = BucketedCache<String, u64, String>;

const WINDOW: Duration = Duration::from_secs(60);

/// Cache on a manual clock sitting at the start of bucket 1000.
fn make_cache(max_entries: usize) -> (TestCache, ManualClock) {
    let clock = ManualClock::new(WINDOW * 1000);
    let policy = CachePolicy::new(WINDOW, max_entries).unwrap();
    (BucketedCache::with_clock(policy, Arc::new(clock.clone())), clock)
}

/// Compute closure that counts invocations and returns `value`.
fn counting(
    calls: &Arc<AtomicUsize>,
    value: u64,
) -> impl FnOnce() -> futures::future::Ready<Result<u64, String>> + Send + 'static {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(value))
    }
}

// -- policy ------------------------------------------------------------

#[test]
fn policy_rejects_zero_window_and_capacity() {
    assert!(matches!(
        CachePolicy::new(Duration::from_millis(500), 10),
        Err(PolicyError::ZeroWindow(_))
    ));
    assert_eq!(
        CachePolicy::new(WINDOW, 0).unwrap_err(),
        PolicyError::ZeroCapacity
    );
    assert_eq!(
        CachePolicy::new(Duration::from_millis(1500), 10).unwrap_err(),
        PolicyError::FractionalWindow(Duration::from_millis(1500))
    );
    let policy = CachePolicy::new(WINDOW, 10).unwrap();
    assert_eq!(policy.window(), WINDOW);
    assert_eq!(policy.max_entries(), 10);
}

// -- bucket determinism and expiry -------------------------------------

#[tokio::test]
async fn same_bucket_computes_once() {
    let (cache, clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache.get_or_compute("repo".into(), counting(&calls, 7)).await.unwrap();
    clock.advance(Duration::from_secs(59));
    let second = cache.get_or_compute("repo".into(), counting(&calls, 99)).await.unwrap();

    assert_eq!(first, 7);
    assert_eq!(second, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn next_bucket_recomputes() {
    let (cache, clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    assert_eq!(cache.get_or_compute("repo".into(), counting(&calls, 1)).await.unwrap(), 1);
    clock.advance(WINDOW);
    assert_eq!(cache.get_or_compute("repo".into(), counting(&calls, 2)).await.unwrap(), 2);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.peek(&"repo".to_string()), Some(2));
}

#[tokio::test]
async fn clock_moving_back_revisits_old_bucket() {
    let (cache, clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    cache.get_or_compute("repo".into(), counting(&calls, 1)).await.unwrap();
    clock.advance(WINDOW);
    cache.get_or_compute("repo".into(), counting(&calls, 2)).await.unwrap();
    clock.set(WINDOW * 1000);

    let value = cache.get_or_compute("repo".into(), counting(&calls, 3)).await.unwrap();
    assert_eq!(value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn per_call_window_keeps_entries_apart() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    let short = cache
        .get_or_compute_within("repo".into(), WINDOW, counting(&calls, 1))
        .await
        .unwrap();
    let long = cache
        .get_or_compute_within("repo".into(), WINDOW * 10, counting(&calls, 2))
        .await
        .unwrap();

    assert_eq!((short, long), (1, 2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn zero_window_is_rejected_per_call() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));
    let err = cache
        .get_or_compute_within("repo".into(), Duration::ZERO, counting(&calls, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidWindow));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fractional_window_is_rejected_per_call() {
    let (cache, clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));
    let window = Duration::from_millis(1500);

    let err = cache
        .get_or_compute_within("repo".into(), window, counting(&calls, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidWindow));

    clock.advance(Duration::from_millis(1200));
    assert!(cache
        .get_or_compute_within("repo".into(), window, counting(&calls, 2))
        .await
        .is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(cache.is_empty());
}

// -- eviction ----------------------------------------------------------

#[tokio::test]
async fn overflow_evicts_least_recently_used() {
    let (cache, _clock) = make_cache(2);
    let calls = Arc::new(AtomicUsize::new(0));

    cache.get_or_compute("a".into(), counting(&calls, 1)).await.unwrap();
    cache.get_or_compute("b".into(), counting(&calls, 2)).await.unwrap();
    // Touch "a" so "b" becomes least recently used.
    cache.get_or_compute("a".into(), counting(&calls, 100)).await.unwrap();
    cache.get_or_compute("c".into(), counting(&calls, 3)).await.unwrap();

    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Survivors come back without recomputation.
    assert_eq!(cache.get_or_compute("a".into(), counting(&calls, 100)).await.unwrap(), 1);
    assert_eq!(cache.get_or_compute("c".into(), counting(&calls, 100)).await.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(cache.peek(&"b".to_string()).is_none());
}

#[tokio::test]
async fn stale_buckets_age_out_under_pressure() {
    let (cache, clock) = make_cache(2);
    let calls = Arc::new(AtomicUsize::new(0));

    cache.get_or_compute("a".into(), counting(&calls, 1)).await.unwrap();
    clock.advance(WINDOW);
    cache.get_or_compute("a".into(), counting(&calls, 2)).await.unwrap();
    cache.get_or_compute("b".into(), counting(&calls, 3)).await.unwrap();

    // The bucket-1000 entry for "a" was the one evicted.
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.peek(&"a".to_string()), Some(2));
    assert_eq!(cache.peek(&"b".to_string()), Some(3));
}

// -- failures ----------------------------------------------------------

#[tokio::test]
async fn failure_is_not_cached() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&calls);
    let err = cache
        .get_or_compute("repo".into(), move || async move {
            c.fetch_add(1, Ordering::SeqCst);
            Err::<u64, _>("index unavailable".to_string())
        })
        .await
        .unwrap_err();
    assert_eq!(err.computation().map(String::as_str), Some("index unavailable"));
    assert!(cache.is_empty());

    let value = cache.get_or_compute("repo".into(), counting(&calls, 5)).await.unwrap();
    assert_eq!(value, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let stats = cache.stats();
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test]
async fn panicking_computation_releases_its_slot() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));

    let err = cache
        .get_or_compute("repo".into(), || async {
            if true {
                panic!("model crashed");
            }
            Ok::<u64, String>(0)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Aborted(_)));
    assert_eq!(cache.stats().in_flight, 0);

    let value = cache.get_or_compute("repo".into(), counting(&calls, 9)).await.unwrap();
    assert_eq!(value, 9);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// -- singleflight ------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_share_one_computation() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        let calls = Arc::clone(&calls);
        let release_rx = Arc::clone(&release_rx);
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute("repo".into(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if let Some(rx) = release_rx.lock().await.take() {
                        rx.await.ok();
                    }
                    Ok::<u64, String>(42)
                })
                .await
        }));
    }

    // Let every caller register before the computation finishes.
    while cache.stats().misses + cache.stats().coalesced < 16 {
        tokio::task::yield_now().await;
    }
    release_tx.send(()).unwrap();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 42);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.coalesced, 15);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_all_see_the_failure() {
    let (cache, _clock) = make_cache(8);
    let calls = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        let calls = Arc::clone(&calls);
        let release_rx = Arc::clone(&release_rx);
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute("repo".into(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if let Some(rx) = release_rx.lock().await.take() {
                        rx.await.ok();
                    }
                    Err::<u64, _>("timeout".to_string())
                })
                .await
        }));
    }

    while cache.stats().misses + cache.stats().coalesced < 4 {
        tokio::task::yield_now().await;
    }
    release_tx.send(()).unwrap();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.computation().map(String::as_str), Some("timeout"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_key_does_not_block_other_keys() {
    let (cache, _clock) = make_cache(8);
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let slow = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute("slow".into(), move || async move {
                    release_rx.await.ok();
                    Ok::<u64, String>(1)
                })
                .await
        })
    };
    while cache.stats().in_flight == 0 {
        tokio::task::yield_now().await;
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let fast = tokio::time::timeout(
        Duration::from_secs(5),
        cache.get_or_compute("fast".into(), counting(&calls, 2)),
    )
    .await
    .expect("unrelated key blocked behind an in-flight computation")
    .unwrap();
    assert_eq!(fast, 2);

    release_tx.send(()).unwrap();
    assert_eq!(slow.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn dropped_caller_does_not_cancel_the_computation() {
    let (cache, _clock) = make_cache(8);
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let calls = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&calls);
    let caller = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute("repo".into(), move || async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    release_rx.await.ok();
                    Ok::<u64, String>(11)
                })
                .await
        })
    };
    while cache.stats().in_flight == 0 {
        tokio::task::yield_now().await;
    }
    caller.abort();
    let _ = caller.await;

    release_tx.send(()).unwrap();
    while cache.stats().in_flight != 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(cache.peek(&"repo".to_string()), Some(11));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
