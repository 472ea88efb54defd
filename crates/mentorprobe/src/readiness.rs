//! Readiness detection.
//!
//! A page is ready when four signals hold, checked in a fixed order:
//!
//! 1. **Navigating**: `document.readyState` satisfies the [`LoadState`]
//! 2. **DrainingIndicators**: visible loading indicators have disappeared
//! 3. **ContentCheck**: the body renders at least `min_content_words` words
//! 4. **Stabilization**: a result count stops changing (optional)
//!
//! Each phase has its own bound and an overall gate timeout caps the whole
//! pipeline. Callers get either a complete [`ReadinessReport`] or an error
//! naming the phase that failed. The detector only reads the page, so
//! calling it again on a ready page is harmless.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SuiteConfig;
use crate::driver::{DocumentState, PageDriver};
use crate::locator::{CandidateList, Strategy};
use crate::result::{FailureContext, ProbeError, Result};

/// Network idle threshold (500ms without new resource entries)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Phases of the readiness pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPhase {
    /// Waiting for the document load state
    Navigating,
    /// Waiting for loading indicators to hide
    DrainingIndicators,
    /// Checking rendered content volume
    ContentCheck,
    /// Waiting for a count to settle
    Stabilization,
    /// All signals resolved
    Ready,
}

impl ReadinessPhase {
    /// Phase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Navigating => "navigating",
            Self::DrainingIndicators => "draining_indicators",
            Self::ContentCheck => "content_check",
            Self::Stabilization => "stabilization",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for ReadinessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page load states (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no new resources for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// Whether a document state satisfies this load state.
    ///
    /// Network idle additionally requires a quiet resource window.
    #[must_use]
    pub fn satisfied_by(&self, state: DocumentState) -> bool {
        match self {
            Self::DomContentLoaded => state >= DocumentState::Interactive,
            Self::Load | Self::NetworkIdle => state == DocumentState::Complete,
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Options for the readiness gate
#[derive(Debug, Clone)]
pub struct ReadinessOptions {
    /// Load state to wait for
    pub wait_until: LoadState,
    /// Bound on the navigating phase
    pub page_load_timeout_ms: u64,
    /// Bound per visible loading indicator
    pub indicator_timeout_ms: u64,
    /// Bound on the whole pipeline
    pub gate_timeout_ms: u64,
    /// Polling interval
    pub poll_interval_ms: u64,
    /// Delay between stabilization samples
    pub settle_delay_ms: u64,
    /// Quiet window for network idle
    pub network_idle_ms: u64,
    /// Minimum words of body text
    pub min_content_words: usize,
    /// Loading indicators to drain
    pub loading_indicators: Vec<Strategy>,
    /// Count that must stabilize, if any
    pub count_target: Option<CandidateList>,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            wait_until: LoadState::Load,
            page_load_timeout_ms: 30_000,
            indicator_timeout_ms: 10_000,
            gate_timeout_ms: 60_000,
            poll_interval_ms: 100,
            settle_delay_ms: 500,
            network_idle_ms: NETWORK_IDLE_THRESHOLD_MS,
            min_content_words: 20,
            loading_indicators: Vec::new(),
            count_target: None,
        }
    }
}

impl ReadinessOptions {
    /// Options derived from suite configuration
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        let t = &config.timeouts;
        Self {
            wait_until: LoadState::Load,
            page_load_timeout_ms: t.page_load_ms,
            indicator_timeout_ms: t.medium_ms,
            gate_timeout_ms: t.page_load_ms + t.long_ms,
            poll_interval_ms: t.poll_ms,
            settle_delay_ms: t.settle_ms,
            network_idle_ms: NETWORK_IDLE_THRESHOLD_MS,
            min_content_words: config.heuristics.min_content_words,
            loading_indicators: config.selectors.loading_indicators.clone(),
            count_target: None,
        }
    }

    /// Set load state to wait for
    #[must_use]
    pub const fn with_wait_until(mut self, state: LoadState) -> Self {
        self.wait_until = state;
        self
    }

    /// Set the navigating bound
    #[must_use]
    pub const fn with_page_load_timeout(mut self, ms: u64) -> Self {
        self.page_load_timeout_ms = ms;
        self
    }

    /// Set the per-indicator bound
    #[must_use]
    pub const fn with_indicator_timeout(mut self, ms: u64) -> Self {
        self.indicator_timeout_ms = ms;
        self
    }

    /// Set the overall gate bound
    #[must_use]
    pub const fn with_gate_timeout(mut self, ms: u64) -> Self {
        self.gate_timeout_ms = ms;
        self
    }

    /// Set the settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Set the minimum content words
    #[must_use]
    pub const fn with_min_content_words(mut self, words: usize) -> Self {
        self.min_content_words = words;
        self
    }

    /// Set the loading indicators
    #[must_use]
    pub fn with_loading_indicators(mut self, indicators: Vec<Strategy>) -> Self {
        self.loading_indicators = indicators;
        self
    }

    /// Require `target`'s count to stabilize
    #[must_use]
    pub fn with_count_target(mut self, target: CandidateList) -> Self {
        self.count_target = Some(target);
        self
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// The four readiness signals, all resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessSignals {
    /// Load state reached
    pub navigation_settled: bool,
    /// No loading indicator visible
    pub spinners_hidden: bool,
    /// Content threshold met
    pub min_content_met: bool,
    /// Count settled (trivially true without a count target)
    pub count_stable: bool,
}

/// Count samples taken during stabilization.
///
/// At most two settle delays are spent: if the first two samples differ, a
/// third is taken and accepted regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StabilizationSample {
    /// Sample before the first settle delay
    pub first: usize,
    /// Sample after the first settle delay
    pub second: usize,
    /// Sample after the second settle delay, when one was needed
    pub third: Option<usize>,
}

impl StabilizationSample {
    /// Accepted count
    #[must_use]
    pub fn settled_value(&self) -> usize {
        self.third.unwrap_or(self.second)
    }

    /// Number of settle delays spent
    #[must_use]
    pub fn delays(&self) -> u32 {
        if self.third.is_some() {
            2
        } else {
            1
        }
    }
}

/// Outcome of a successful readiness gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    /// Resolved signals
    pub signals: ReadinessSignals,
    /// Words counted in the body
    pub words: usize,
    /// Stabilization samples, when a count target was given
    pub sample: Option<StabilizationSample>,
    /// Time spent in the gate
    #[serde(serialize_with = "serialize_ms")]
    pub elapsed: Duration,
}

impl ReadinessReport {
    /// Accepted count, when a count target was given
    #[must_use]
    pub fn stable_count(&self) -> Option<usize> {
        self.sample.as_ref().map(StabilizationSample::settled_value)
    }
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Runs the readiness pipeline
#[derive(Debug, Clone)]
pub struct ReadinessDetector {
    clock: Arc<dyn Clock>,
}

impl ReadinessDetector {
    /// Create a detector on `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Run all phases
    ///
    /// # Errors
    ///
    /// - `NavigationTimeout` if the load state is not reached in time
    /// - `ReadinessTimeout` if an indicator stays visible or the gate expires
    /// - `InsufficientContent` if the body is below the word threshold
    pub async fn await_ready(
        &self,
        driver: &dyn PageDriver,
        options: &ReadinessOptions,
    ) -> Result<ReadinessReport> {
        let start = self.clock.now();
        let url = driver.current_url().await.unwrap_or_default();

        self.await_load_state(driver, options, &url).await?;
        self.check_gate(start, options, ReadinessPhase::Navigating, &url)?;

        self.drain_indicators(driver, options, &url).await?;
        self.check_gate(start, options, ReadinessPhase::DrainingIndicators, &url)?;

        let words = self.check_content(driver, options, &url, start).await?;
        self.check_gate(start, options, ReadinessPhase::ContentCheck, &url)?;

        let sample = match &options.count_target {
            Some(target) => {
                let sample = self.stabilize(driver, target, options).await;
                self.check_gate(start, options, ReadinessPhase::Stabilization, &url)?;
                Some(sample)
            }
            None => None,
        };

        let elapsed = self.clock.since(start);
        info!(
            phase = %ReadinessPhase::Ready,
            url = %url,
            words,
            elapsed_ms = elapsed.as_millis() as u64,
            "page ready"
        );
        Ok(ReadinessReport {
            signals: ReadinessSignals {
                navigation_settled: true,
                spinners_hidden: true,
                min_content_met: true,
                count_stable: true,
            },
            words,
            sample,
            elapsed,
        })
    }

    /// Run the navigating and indicator phases only
    ///
    /// # Errors
    ///
    /// Returns `NavigationTimeout` or `ReadinessTimeout`
    pub async fn await_navigation(
        &self,
        driver: &dyn PageDriver,
        options: &ReadinessOptions,
    ) -> Result<Duration> {
        let start = self.clock.now();
        let url = driver.current_url().await.unwrap_or_default();

        self.await_load_state(driver, options, &url).await?;
        self.check_gate(start, options, ReadinessPhase::Navigating, &url)?;
        self.drain_indicators(driver, options, &url).await?;
        self.check_gate(start, options, ReadinessPhase::DrainingIndicators, &url)?;

        Ok(self.clock.since(start))
    }

    fn check_gate(
        &self,
        start: Duration,
        options: &ReadinessOptions,
        phase: ReadinessPhase,
        url: &str,
    ) -> Result<()> {
        if self.clock.since(start) > Duration::from_millis(options.gate_timeout_ms) {
            warn!(phase = %phase, url = %url, "readiness gate expired");
            return Err(ProbeError::ReadinessTimeout {
                phase,
                ms: options.gate_timeout_ms,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    async fn await_load_state(
        &self,
        driver: &dyn PageDriver,
        options: &ReadinessOptions,
        url: &str,
    ) -> Result<()> {
        debug!(phase = %ReadinessPhase::Navigating, wait_until = %options.wait_until, url = %url);
        let bound = Duration::from_millis(options.page_load_timeout_ms);
        let idle_window = Duration::from_millis(options.network_idle_ms);
        let start = self.clock.now();
        let mut quiet_since: Option<(usize, Duration)> = None;

        loop {
            let state = match driver.document_state().await {
                Ok(state) => Some(state),
                Err(e) => {
                    debug!(error = %e, "document state unavailable");
                    None
                }
            };

            if state.is_some_and(|s| options.wait_until.satisfied_by(s)) {
                if options.wait_until != LoadState::NetworkIdle {
                    return Ok(());
                }
                match driver.resource_count().await {
                    Ok(count) => match quiet_since {
                        Some((last, since)) if last == count => {
                            if self.clock.since(since) >= idle_window {
                                return Ok(());
                            }
                        }
                        _ => quiet_since = Some((count, self.clock.now())),
                    },
                    Err(_) => quiet_since = None,
                }
            }

            let waited = self.clock.since(start);
            if waited >= bound {
                warn!(phase = %ReadinessPhase::Navigating, url = %url, ?state, "navigation did not settle");
                return Err(ProbeError::NavigationTimeout {
                    url: url.to_string(),
                    ms: options.page_load_timeout_ms,
                });
            }
            self.clock
                .sleep(options.poll_interval().min(bound - waited))
                .await;
        }
    }

    async fn drain_indicators(
        &self,
        driver: &dyn PageDriver,
        options: &ReadinessOptions,
        url: &str,
    ) -> Result<()> {
        let bound = Duration::from_millis(options.indicator_timeout_ms);

        for indicator in &options.loading_indicators {
            if !driver.is_visible(indicator).await.unwrap_or(false) {
                continue;
            }
            debug!(phase = %ReadinessPhase::DrainingIndicators, indicator = %indicator, "waiting for indicator");
            let start = self.clock.now();
            loop {
                let waited = self.clock.since(start);
                if waited >= bound {
                    warn!(indicator = %indicator, url = %url, "loading indicator stayed visible");
                    return Err(ProbeError::ReadinessTimeout {
                        phase: ReadinessPhase::DrainingIndicators,
                        ms: options.indicator_timeout_ms,
                        url: url.to_string(),
                    });
                }
                self.clock
                    .sleep(options.poll_interval().min(bound - waited))
                    .await;
                if !driver.is_visible(indicator).await.unwrap_or(false) {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn check_content(
        &self,
        driver: &dyn PageDriver,
        options: &ReadinessOptions,
        url: &str,
        start: Duration,
    ) -> Result<usize> {
        let body = driver
            .body_text()
            .await
            .map_err(|source| ProbeError::Driver {
                action: "content check",
                context: FailureContext::new("body", self.clock.since(start), Some(url.to_string())),
                source,
            })?;
        let words = body.split_whitespace().count();
        debug!(phase = %ReadinessPhase::ContentCheck, words, min = options.min_content_words);
        if words < options.min_content_words {
            return Err(ProbeError::InsufficientContent {
                url: url.to_string(),
                words,
                min: options.min_content_words,
            });
        }
        Ok(words)
    }

    async fn stabilize(
        &self,
        driver: &dyn PageDriver,
        target: &CandidateList,
        options: &ReadinessOptions,
    ) -> StabilizationSample {
        let settle = options.settle_delay();
        let first = count_matches(driver, target).await;
        self.clock.sleep(settle).await;
        let second = count_matches(driver, target).await;

        let third = if first == second {
            None
        } else {
            self.clock.sleep(settle).await;
            Some(count_matches(driver, target).await)
        };

        let sample = StabilizationSample {
            first,
            second,
            third,
        };
        debug!(
            phase = %ReadinessPhase::Stabilization,
            concept = %target.concept,
            first,
            second,
            ?third,
            "count sampled"
        );
        sample
    }
}

/// Match count of the first candidate with a non-zero count, or 0
pub(crate) async fn count_matches(driver: &dyn PageDriver, list: &CandidateList) -> usize {
    for strategy in list.iter() {
        match driver.count(strategy).await {
            Ok(0) => {}
            Ok(n) => return n,
            Err(e) => debug!(strategy = %strategy, error = %e, "count failed"),
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::fake::{FakeDriver, FakeElement};

    const BODY: &str = "Find a mentor who has walked the path before you. Browse experienced \
                        engineers designers and product people who volunteer their time to help \
                        others grow in their careers.";

    fn setup() -> (Arc<FakeClock>, FakeDriver, ReadinessDetector) {
        let clock = FakeClock::shared();
        let driver = FakeDriver::new(Arc::clone(&clock));
        driver.set_body_text(BODY);
        let detector = ReadinessDetector::new(clock.clone());
        (clock, driver, detector)
    }

    fn cards() -> CandidateList {
        CandidateList::new("mentor cards").or(Strategy::css(".mentor-card"))
    }

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_satisfied_by() {
            assert!(LoadState::DomContentLoaded.satisfied_by(DocumentState::Interactive));
            assert!(LoadState::DomContentLoaded.satisfied_by(DocumentState::Complete));
            assert!(!LoadState::Load.satisfied_by(DocumentState::Interactive));
            assert!(LoadState::Load.satisfied_by(DocumentState::Complete));
            assert!(!LoadState::NetworkIdle.satisfied_by(DocumentState::Loading));
        }

        #[test]
        fn test_event_names() {
            assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
            assert_eq!(LoadState::default(), LoadState::Load);
        }
    }

    mod navigating_tests {
        use super::*;

        #[tokio::test]
        async fn test_waits_for_complete() {
            let (clock, driver, detector) = setup();
            driver.set_document_schedule(vec![
                (0, DocumentState::Loading),
                (300, DocumentState::Interactive),
                (800, DocumentState::Complete),
            ]);
            driver.goto("http://localhost:3000/mentoring").await.unwrap();

            let report = detector
                .await_ready(&driver, &ReadinessOptions::default())
                .await
                .unwrap();
            assert!(report.signals.navigation_settled);
            assert_eq!(clock.now_ms(), 800);
        }

        #[tokio::test]
        async fn test_dom_content_loaded_is_earlier() {
            let (clock, driver, detector) = setup();
            driver.set_document_schedule(vec![
                (0, DocumentState::Loading),
                (300, DocumentState::Interactive),
                (800, DocumentState::Complete),
            ]);
            let options = ReadinessOptions::default().with_wait_until(LoadState::DomContentLoaded);
            let _ = detector.await_navigation(&driver, &options).await.unwrap();
            assert_eq!(clock.now_ms(), 300);
        }

        #[tokio::test]
        async fn test_network_idle_needs_quiet_window() {
            let (clock, driver, detector) = setup();
            driver.set_resource_schedule(vec![(0, 3), (200, 7), (400, 9)]);
            let options = ReadinessOptions::default().with_wait_until(LoadState::NetworkIdle);

            let _ = detector.await_navigation(&driver, &options).await.unwrap();
            assert_eq!(clock.now_ms(), 400 + NETWORK_IDLE_THRESHOLD_MS);
        }

        #[tokio::test]
        async fn test_navigation_timeout() {
            let (clock, driver, detector) = setup();
            driver.set_document_schedule(vec![(0, DocumentState::Loading)]);
            driver.goto("http://localhost:3000/slow").await.unwrap();
            let options = ReadinessOptions::default().with_page_load_timeout(2_000);

            let err = detector.await_ready(&driver, &options).await.unwrap_err();
            assert_eq!(err.kind(), crate::result::ErrorKind::NavigationTimeout);
            assert!(err.to_string().contains("/slow"));
            assert_eq!(clock.now_ms(), 2_000);
        }
    }

    mod indicator_tests {
        use super::*;

        #[tokio::test]
        async fn test_absent_indicators_are_fine() {
            let (clock, driver, detector) = setup();
            let options = ReadinessOptions::default()
                .with_loading_indicators(vec![Strategy::css(".spinner")]);
            let _ = detector.await_ready(&driver, &options).await.unwrap();
            assert_eq!(clock.total_slept(), Duration::ZERO);
        }

        #[tokio::test]
        async fn test_waits_for_spinner_to_hide() {
            let (clock, driver, detector) = setup();
            driver.add_element(Strategy::css(".spinner"), FakeElement::new().hiding_at(1_200));
            let options = ReadinessOptions::default()
                .with_loading_indicators(vec![Strategy::css(".spinner")]);

            let report = detector.await_ready(&driver, &options).await.unwrap();
            assert!(report.signals.spinners_hidden);
            assert_eq!(clock.now_ms(), 1_200);
        }

        #[tokio::test]
        async fn test_stuck_spinner_is_readiness_timeout() {
            let (_, driver, detector) = setup();
            driver.add_element(Strategy::css(".spinner"), FakeElement::new());
            let options = ReadinessOptions::default()
                .with_indicator_timeout(1_000)
                .with_loading_indicators(vec![Strategy::css(".spinner")]);

            let err = detector.await_ready(&driver, &options).await.unwrap_err();
            match err {
                ProbeError::ReadinessTimeout { phase, ms, .. } => {
                    assert_eq!(phase, ReadinessPhase::DrainingIndicators);
                    assert_eq!(ms, 1_000);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod content_tests {
        use super::*;

        #[tokio::test]
        async fn test_blank_page_is_insufficient() {
            let (_, driver, detector) = setup();
            driver.set_body_text("Loading...");
            let err = detector
                .await_ready(&driver, &ReadinessOptions::default())
                .await
                .unwrap_err();
            match err {
                ProbeError::InsufficientContent { words, min, .. } => {
                    assert_eq!(words, 1);
                    assert_eq!(min, 20);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_threshold_is_configurable() {
            let (_, driver, detector) = setup();
            driver.set_body_text("Mentors");
            let options = ReadinessOptions::default().with_min_content_words(1);
            let report = detector.await_ready(&driver, &options).await.unwrap();
            assert_eq!(report.words, 1);
        }
    }

    mod stabilization_tests {
        use super::*;

        #[tokio::test]
        async fn test_stable_count_uses_one_delay() {
            let (clock, driver, detector) = setup();
            driver.add_element(Strategy::css(".mentor-card"), FakeElement::new().with_matches(6));
            let options = ReadinessOptions::default().with_count_target(cards());

            let report = detector.await_ready(&driver, &options).await.unwrap();
            assert_eq!(report.stable_count(), Some(6));
            assert_eq!(clock.total_slept(), Duration::from_millis(500));
        }

        #[tokio::test]
        async fn test_unstable_count_bounded_by_two_delays() {
            let (clock, driver, detector) = setup();
            driver.add_element(
                Strategy::css(".mentor-card"),
                FakeElement::new().with_count_samples([1, 4, 9, 12]),
            );
            let options = ReadinessOptions::default()
                .with_settle_delay(300)
                .with_count_target(cards());

            let report = detector.await_ready(&driver, &options).await.unwrap();
            let sample = report.sample.unwrap();
            assert_eq!(sample.third, Some(9));
            assert_eq!(sample.delays(), 2);
            assert_eq!(report.stable_count(), Some(9));
            assert!(clock.total_slept() <= Duration::from_millis(600));
        }

        #[tokio::test]
        async fn test_missing_target_counts_zero() {
            let (_, driver, detector) = setup();
            let options = ReadinessOptions::default().with_count_target(cards());
            let report = detector.await_ready(&driver, &options).await.unwrap();
            assert_eq!(report.stable_count(), Some(0));
        }
    }

    mod gate_tests {
        use super::*;

        #[tokio::test]
        async fn test_gate_timeout_names_phase() {
            let (_, driver, detector) = setup();
            driver.add_element(Strategy::css(".spinner"), FakeElement::new().hiding_at(3_000));
            let options = ReadinessOptions::default()
                .with_gate_timeout(2_000)
                .with_loading_indicators(vec![Strategy::css(".spinner")]);

            let err = detector.await_ready(&driver, &options).await.unwrap_err();
            match err {
                ProbeError::ReadinessTimeout { phase, ms, .. } => {
                    assert_eq!(phase, ReadinessPhase::DrainingIndicators);
                    assert_eq!(ms, 2_000);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_ready_is_idempotent() {
            let (_, driver, detector) = setup();
            driver.add_element(Strategy::css(".mentor-card"), FakeElement::new().with_matches(3));
            let options = ReadinessOptions::default().with_count_target(cards());

            let first = detector.await_ready(&driver, &options).await.unwrap();
            driver.clear_history();
            let second = detector.await_ready(&driver, &options).await.unwrap();

            assert_eq!(first.signals, second.signals);
            assert_eq!(first.stable_count(), second.stable_count());
            assert!(driver.was_called("document_state"));
            assert!(driver.mutations().is_empty());
        }

        #[tokio::test]
        async fn test_options_from_config() {
            let config = SuiteConfig::default();
            let options = ReadinessOptions::from_config(&config);
            assert_eq!(options.page_load_timeout_ms, config.timeouts.page_load_ms);
            assert_eq!(options.min_content_words, config.heuristics.min_content_words);
            assert_eq!(
                options.loading_indicators,
                config.selectors.loading_indicators
            );
        }
    }
}
