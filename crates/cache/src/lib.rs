//! Time-bucketed memoization for expensive downstream calls.
//!
//! [`BucketedCache`] addresses every entry by `(key, window, bucket)` where
//! `bucket = floor(now / window)`. Freshness is therefore a pure function of
//! the clock: a new bucket is a new key, and stale buckets fall out of the
//! bounded LRU under pressure. No sweeper task, no per-entry timestamps.
//!
//! Concurrent misses on the same `(key, bucket)` collapse into a single
//! computation; every waiter receives the one result.

pub mod bucket;
pub mod clock;
pub mod error;
pub mod memo;
pub mod stats;

#[cfg(test)]
mod tests;

pub use bucket::{bucket_index, BucketKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, PolicyError};
pub use memo::{BucketedCache, CachePolicy};
pub use stats::CacheStats;
