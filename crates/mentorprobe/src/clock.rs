//! Clocks for bounded waits.
//!
//! Every polling loop in the resolver and the readiness detector measures time
//! and sleeps through a [`Clock`]. Production code uses [`SystemClock`]; tests
//! inject a [`FakeClock`] whose `sleep` advances virtual time instantly, so
//! timeout paths run deterministically and without wall-clock delay.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source with an async sleep
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);

    /// Time elapsed since an earlier reading of [`Clock::now`]
    fn since(&self, earlier: Duration) -> Duration {
        self.now().saturating_sub(earlier)
    }
}

/// Wall-clock time backed by tokio timers
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for deterministic tests.
///
/// `sleep` returns immediately after advancing the clock, and the total time
/// slept is tracked separately so tests can assert on wait budgets.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
    slept_ms: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared fake clock
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advance time without counting it as sleep
    pub fn advance(&self, duration: Duration) {
        let _ = self
            .current_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Total time spent in `sleep`
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }

    /// Reset the sleep counter (time itself keeps running)
    pub fn reset_slept(&self) {
        self.slept_ms.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    async fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis() as u64;
        let _ = self.current_ms.fetch_add(ms, Ordering::SeqCst);
        let _ = self.slept_ms.fetch_add(ms, Ordering::SeqCst);
    }
}
