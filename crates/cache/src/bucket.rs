//! Time-bucket arithmetic and composite cache keys.

use std::time::Duration;

/// Index of the window-wide bucket containing `now`.
///
/// `window` must be a whole number of seconds, at least one; callers
/// validate this through [`CachePolicy`](crate::CachePolicy).
pub fn bucket_index(now: Duration, window: Duration) -> u64 {
    let window_secs = window.as_secs().max(1);
    now.as_secs() / window_secs
}

/// Composite address of a memoized value.
///
/// The window length is part of the key so that calls made with different
/// windows never read each other's bucket indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey<K> {
    pub key: K,
    pub window_secs: u64,
    pub bucket: u64,
}

impl<K> BucketKey<K> {
    pub fn new(key: K, window: Duration, now: Duration) -> Self {
        Self {
            key,
            window_secs: window.as_secs(),
            bucket: bucket_index(now, window),
        }
    }
}
