//! Selector resolution with an ordered fallback chain.
//!
//! Candidates are tried left to right. Each one is polled for visibility
//! until the per-candidate probe timeout elapses; the first visible
//! candidate wins even when later ones would also match.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::driver::PageDriver;
use crate::locator::{CandidateList, Strategy};
use crate::result::{FailureContext, ProbeError, Result};

/// Default per-candidate probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1_500);

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of resolving a candidate list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Whether any candidate became visible
    pub found: bool,
    /// The winning strategy
    pub strategy_used: Option<Strategy>,
    /// Total time spent resolving
    pub elapsed: Duration,
}

impl ProbeResult {
    fn hit(strategy: &Strategy, elapsed: Duration) -> Self {
        Self {
            found: true,
            strategy_used: Some(strategy.clone()),
            elapsed,
        }
    }

    fn miss(elapsed: Duration) -> Self {
        Self {
            found: false,
            strategy_used: None,
            elapsed,
        }
    }
}

/// Resolves candidate lists against a page
#[derive(Debug, Clone)]
pub struct SelectorResolver {
    clock: Arc<dyn Clock>,
    probe_timeout: Duration,
    poll_interval: Duration,
}

impl SelectorResolver {
    /// Create a resolver with default timings
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the per-candidate probe timeout
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Per-candidate probe timeout
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Resolve `list`, waiting up to the probe timeout per candidate.
    ///
    /// Never fails: exhaustion is `found = false`, and a driver error
    /// during a probe counts as "not visible".
    pub async fn resolve(&self, driver: &dyn PageDriver, list: &CandidateList) -> ProbeResult {
        self.resolve_within(driver, list, self.probe_timeout).await
    }

    /// Resolve `list` probing each candidate exactly once
    pub async fn resolve_now(&self, driver: &dyn PageDriver, list: &CandidateList) -> ProbeResult {
        self.resolve_within(driver, list, Duration::ZERO).await
    }

    /// Resolve `list` with an explicit per-candidate bound
    pub async fn resolve_within(
        &self,
        driver: &dyn PageDriver,
        list: &CandidateList,
        per_candidate: Duration,
    ) -> ProbeResult {
        let start = self.clock.now();

        for strategy in list.iter() {
            if self.probe(driver, strategy, per_candidate).await {
                let elapsed = self.clock.since(start);
                info!(
                    concept = %list.concept,
                    strategy = %strategy,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "resolved element"
                );
                return ProbeResult::hit(strategy, elapsed);
            }
            debug!(concept = %list.concept, strategy = %strategy, "candidate not visible");
        }

        let elapsed = self.clock.since(start);
        debug!(
            concept = %list.concept,
            tried = list.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "no candidate visible"
        );
        ProbeResult::miss(elapsed)
    }

    /// Resolve `list` or fail with [`ProbeError::ElementNotAvailable`]
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when no candidate becomes visible
    pub async fn require(&self, driver: &dyn PageDriver, list: &CandidateList) -> Result<Strategy> {
        let result = self.resolve(driver, list).await;
        match result.strategy_used {
            Some(strategy) => Ok(strategy),
            None => Err(ProbeError::ElementNotAvailable {
                concept: list.concept.clone(),
                tried: list.len(),
                context: FailureContext::new(
                    list.concept.clone(),
                    result.elapsed,
                    driver.current_url().await.ok(),
                ),
            }),
        }
    }

    async fn probe(&self, driver: &dyn PageDriver, strategy: &Strategy, bound: Duration) -> bool {
        let start = self.clock.now();
        loop {
            match driver.is_visible(strategy).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!(strategy = %strategy, error = %e, "probe failed"),
            }
            let waited = self.clock.since(start);
            if waited >= bound {
                return false;
            }
            self.clock
                .sleep(self.poll_interval.min(bound - waited))
                .await;
        }
    }
}
