//! Sequential scenario runner.
//!
//! Each attempt gets a fresh page from the [`PageLauncher`], sized to the
//! scenario's viewport. Failed attempts are retried up to the configured
//! count, a failure screenshot is captured when enabled, and the page is
//! always closed afterwards.

use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::artifacts::{RunReport, ScenarioRecord, ScenarioStatus};
use crate::clock::Clock;
use crate::config::SuiteConfig;
use crate::driver::PageLauncher;
use crate::mentoring::MentoringPage;
use crate::page::Page;
use crate::result::{ErrorKind, ProbeError, Result};
use crate::scenario::{Scenario, ScenarioOutcome};

/// Default per-scenario timeout
pub const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_secs(120);

/// Progress hooks for a run
pub trait RunObserver: Send + Sync {
    /// A scenario is about to start
    fn scenario_started(&self, _scenario: Scenario) {}

    /// A scenario finished
    fn scenario_finished(&self, _record: &ScenarioRecord) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

impl<T: RunObserver + ?Sized> RunObserver for Arc<T> {
    fn scenario_started(&self, scenario: Scenario) {
        (**self).scenario_started(scenario);
    }

    fn scenario_finished(&self, record: &ScenarioRecord) {
        (**self).scenario_finished(record);
    }
}

/// Compile a scenario filter
///
/// # Errors
///
/// Returns `InvalidInput` for an invalid pattern
pub fn compile_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p)
                .map_err(|e| ProbeError::invalid_input(format!("invalid filter {p:?}: {e}")))
        })
        .transpose()
}

/// Scenarios whose name matches `filter`, in suite order
#[must_use]
pub fn select_scenarios(filter: Option<&Regex>) -> Vec<Scenario> {
    Scenario::ALL
        .into_iter()
        .filter(|s| filter.map_or(true, |re| re.is_match(s.name())))
        .collect()
}

/// Run options
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Scenario name filter
    pub filter: Option<Regex>,
    /// Stop after the first failure
    pub fail_fast: bool,
    /// Per-attempt timeout
    pub scenario_timeout: Duration,
    /// Retries after a failed attempt
    pub retries: u32,
    /// Write `results.json` and `report.html`
    pub write_results: bool,
}

impl RunOptions {
    /// Options derived from configuration
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            filter: None,
            fail_fast: false,
            scenario_timeout: DEFAULT_SCENARIO_TIMEOUT,
            retries: config.effective_retries(),
            write_results: true,
        }
    }
}

/// Runs scenarios one after another
pub struct ScenarioRunner {
    config: Arc<SuiteConfig>,
    launcher: Arc<dyn PageLauncher>,
    clock: Arc<dyn Clock>,
    options: RunOptions,
    observer: Box<dyn RunObserver>,
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("launcher", &self.launcher)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub fn new(
        config: Arc<SuiteConfig>,
        launcher: Arc<dyn PageLauncher>,
        clock: Arc<dyn Clock>,
        options: RunOptions,
    ) -> Self {
        Self {
            config,
            launcher,
            clock,
            options,
            observer: Box::new(SilentObserver),
        }
    }

    /// Attach progress hooks
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Scenarios this runner will execute
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        select_scenarios(self.options.filter.as_ref())
    }

    /// Run the selected scenarios
    ///
    /// # Errors
    ///
    /// Returns error only if result files cannot be written; scenario
    /// failures are recorded in the report
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::new(
            self.config.profile.as_str(),
            self.launcher.engine(),
            &self.config.base_url,
        );
        if self.config.artifacts.video {
            warn!("video capture requested but not supported by this runner; continuing without it");
        }

        for scenario in self.scenarios() {
            self.observer.scenario_started(scenario);
            let record = self.run_scenario(scenario).await;
            self.observer.scenario_finished(&record);
            let failed = record.status.is_failed();
            report.records.push(record);
            if failed && self.options.fail_fast {
                warn!(scenario = scenario.name(), "stopping after first failure");
                break;
            }
        }

        if let Err(e) = self.launcher.shutdown().await {
            warn!(error = %e, "browser shutdown failed");
        }

        if self.options.write_results {
            let (json, html) = report.write_to(&self.config.artifacts.results_dir)?;
            info!(json = %json.display(), html = %html.display(), "results written");
        }
        info!(summary = %report.summary(), "run finished");
        Ok(report)
    }

    /// Run one scenario with retries
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioRecord {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let started = self.clock.now();
            let (outcome, screenshot) = self.attempt(scenario).await;
            let duration_ms = self.clock.since(started).as_millis() as u64;

            let retry = outcome.is_failed() && attempts <= self.options.retries;
            if retry {
                warn!(scenario = scenario.name(), attempt = attempts, "scenario failed, retrying");
                continue;
            }
            return record(scenario, outcome, attempts, duration_ms, screenshot);
        }
    }

    async fn attempt(&self, scenario: Scenario) -> (ScenarioOutcome, Option<PathBuf>) {
        let viewport = scenario.viewport_kind().resolve(&self.config.viewports);
        let driver = match self.launcher.new_page(viewport).await {
            Ok(driver) => driver,
            Err(e) => {
                return (
                    ScenarioOutcome::Failed {
                        kind: ErrorKind::Driver,
                        message: format!("could not open a page: {e}"),
                    },
                    None,
                )
            }
        };
        let page = Page::new(driver, Arc::clone(&self.clock), &self.config);
        let mentoring = MentoringPage::new(page.clone(), Arc::clone(&self.config));

        let timeout = self.options.scenario_timeout;
        let outcome = match tokio::time::timeout(timeout, scenario.run(&mentoring)).await {
            Ok(outcome) => outcome,
            Err(_) => ScenarioOutcome::from_result(Err(ProbeError::ScenarioTimeout {
                scenario: scenario.name().to_string(),
                ms: timeout.as_millis() as u64,
            })),
        };

        let screenshot = if outcome.is_failed() && self.config.artifacts.screenshots {
            match page.screenshot(&format!("failure-{}", scenario.name())).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(scenario = scenario.name(), error = %e, "failure screenshot not captured");
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = page.close().await {
            warn!(scenario = scenario.name(), error = %e, "page close failed");
        }
        (outcome, screenshot)
    }
}

fn record(
    scenario: Scenario,
    outcome: ScenarioOutcome,
    attempts: u32,
    duration_ms: u64,
    screenshot: Option<PathBuf>,
) -> ScenarioRecord {
    let (status, message, error_kind) = match outcome {
        ScenarioOutcome::Passed => (ScenarioStatus::Passed, None, None),
        ScenarioOutcome::Skipped { reason } => (ScenarioStatus::Skipped, Some(reason), None),
        ScenarioOutcome::Failed { kind, message } => (
            ScenarioStatus::Failed,
            Some(message),
            Some(kind.as_str().to_string()),
        ),
    };
    ScenarioRecord {
        name: scenario.name().to_string(),
        status,
        attempts,
        duration_ms,
        message,
        error_kind,
        screenshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::fake::{FakeDriver, FakeElement, FakeLauncher};
    use crate::locator::Strategy;
    use crate::result::DriverError;

    const BODY: &str = "Find a mentor in engineering design product or data. Every mentor \
                        listed here volunteers time each month to help people grow their careers.";

    fn config(dir: &std::path::Path) -> Arc<SuiteConfig> {
        let mut config = SuiteConfig::default();
        config.artifacts.screenshot_dir = dir.join("screenshots");
        config.artifacts.results_dir = dir.join("results");
        Arc::new(config)
    }

    fn mentoring_page(clock: Arc<FakeClock>) -> FakeDriver {
        let d = FakeDriver::new(clock);
        d.set_title("Mentors");
        d.set_body_text(BODY);
        d.add_element(Strategy::css("main"), FakeElement::new());
        d
    }

    fn runner<F>(dir: &std::path::Path, factory: F, options: RunOptions) -> ScenarioRunner
    where
        F: Fn(Arc<FakeClock>) -> FakeDriver + Send + Sync + 'static,
    {
        let clock = FakeClock::shared();
        let launcher = FakeLauncher::new(clock.clone(), factory);
        ScenarioRunner::new(config(dir), Arc::new(launcher), clock, options)
    }

    fn options(filter: &str) -> RunOptions {
        RunOptions {
            filter: compile_filter(Some(filter)).unwrap(),
            fail_fast: false,
            scenario_timeout: Duration::from_secs(10),
            retries: 0,
            write_results: true,
        }
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_no_filter_selects_all() {
            assert_eq!(select_scenarios(None).len(), Scenario::ALL.len());
        }

        #[test]
        fn test_regex_filter() {
            let re = compile_filter(Some("^responsive_")).unwrap();
            let selected = select_scenarios(re.as_ref());
            assert_eq!(
                selected,
                vec![Scenario::ResponsiveMobile, Scenario::ResponsiveTablet]
            );
        }

        #[test]
        fn test_invalid_filter() {
            let err = compile_filter(Some("(")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_passing_run_writes_results() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(dir.path(), mentoring_page, options("^page_loads$"));

            let report = runner.run().await.unwrap();
            assert!(report.all_passed());
            assert_eq!(report.records.len(), 1);
            assert!(dir.path().join("results").join("results.json").exists());
            assert!(dir.path().join("results").join("report.html").exists());
        }

        #[tokio::test]
        async fn test_missing_filter_control_is_skipped() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(dir.path(), mentoring_page, options("^filter_by_category$"));

            let report = runner.run().await.unwrap();
            assert_eq!(report.records[0].status, ScenarioStatus::Skipped);
            assert!(report.all_passed());
        }

        #[tokio::test]
        async fn test_failure_is_retried_and_screenshotted() {
            let dir = tempfile::tempdir().unwrap();
            let clock = FakeClock::shared();
            let launcher = Arc::new(FakeLauncher::new(clock.clone(), |clock| {
                let d = mentoring_page(clock);
                d.set_title("404 Not Found");
                d
            }));
            let mut opts = options("^page_loads$");
            opts.retries = 2;
            let runner = ScenarioRunner::new(
                config(dir.path()),
                launcher.clone(),
                clock,
                opts,
            );

            let report = runner.run().await.unwrap();
            let record = &report.records[0];
            assert_eq!(record.status, ScenarioStatus::Failed);
            assert_eq!(record.attempts, 3);
            assert_eq!(record.error_kind.as_deref(), Some("title_mismatch"));
            let shot = record.screenshot.as_ref().unwrap();
            assert!(shot
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("failure-page_loads-"));
            assert_eq!(launcher.pages_opened(), 3);
            assert!(launcher.pages().iter().all(|p| p.is_closed()));
        }

        #[tokio::test]
        async fn test_fail_fast_stops() {
            let dir = tempfile::tempdir().unwrap();
            let mut opts = RunOptions::from_config(&SuiteConfig::default());
            opts.fail_fast = true;
            opts.retries = 0;
            opts.write_results = false;
            let runner = runner(dir.path(), FakeDriver::new, opts);

            let report = runner.run().await.unwrap();
            assert_eq!(report.records.len(), 1);
            assert_eq!(report.failed_count(), 1);
        }

        #[tokio::test]
        async fn test_launch_failure_is_recorded() {
            let dir = tempfile::tempdir().unwrap();
            let clock = FakeClock::shared();
            let launcher = FakeLauncher::new(clock.clone(), FakeDriver::new)
                .failing(DriverError::BrowserNotFound);
            let runner = ScenarioRunner::new(
                config(dir.path()),
                Arc::new(launcher),
                clock,
                options("^page_loads$"),
            );

            let report = runner.run().await.unwrap();
            let record = &report.records[0];
            assert_eq!(record.error_kind.as_deref(), Some("driver"));
            assert!(record.message.as_deref().unwrap().contains("Browser not found"));
        }
    }
}
