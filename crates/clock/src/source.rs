use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time reading used by [`TickClock`](crate::TickClock).
///
/// `now` returns the time since an arbitrary fixed origin; only differences
/// between readings are meaningful.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    origin: Instant,
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source.
///
/// Clones share the same reading, so a test can keep one clone and advance
/// it while the clock owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(duration_to_nanos(by), Ordering::Relaxed);
    }

    pub fn advance_millis(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, to: Duration) {
        self.nanos.store(duration_to_nanos(to), Ordering::Relaxed);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_clones_share_reading() {
        let a = ManualTime::new();
        let b = a.clone();
        a.advance_millis(25);
        assert_eq!(b.now(), Duration::from_millis(25));
        b.set(Duration::from_secs(2));
        assert_eq!(a.now(), Duration::from_secs(2));
    }

    #[test]
    fn system_time_is_monotonic() {
        let s = SystemTime::new();
        let t0 = s.now();
        let t1 = s.now();
        assert!(t1 >= t0);
    }
}
