//! Time sources for bucket computation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Supplies the current time as an offset from the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock. A clock set before 1970 reads as the epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually driven clock for deterministic tests and replay.
///
/// Clones share the same underlying instant.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

/// Whole milliseconds of `d`, saturating at `u64::MAX`.
fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(saturating_millis(start))),
        }
    }

    pub fn set(&self, to: Duration) {
        self.millis.store(saturating_millis(to), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = saturating_millis(by);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(by)));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let other = clock.clone();
        clock.advance(Duration::from_secs(5));
        assert_eq!(other.now(), Duration::from_secs(15));
        other.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn manual_clock_saturates_instead_of_wrapping() {
        let clock = ManualClock::new(Duration::MAX);
        assert_eq!(clock.now(), Duration::from_millis(u64::MAX));

        clock.set(Duration::from_millis(u64::MAX - 10));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now() > Duration::from_secs(1_577_836_800));
    }
}
