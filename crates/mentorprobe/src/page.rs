//! Page interaction facade.
//!
//! [`Page`] is what scenarios talk to. Targets are [`CandidateList`]s that
//! the facade resolves before acting; every driver failure is wrapped in
//! [`ProbeError::Driver`] with the target, elapsed time and URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::artifacts;
use crate::clock::Clock;
use crate::config::{SuiteConfig, Viewport};
use crate::driver::{LayoutMetrics, PageDriver};
use crate::locator::{CandidateList, Strategy};
use crate::readiness::{self, ReadinessDetector, ReadinessOptions, ReadinessReport};
use crate::resolver::SelectorResolver;
use crate::result::{DriverError, FailureContext, ProbeError, Result};

/// High-level handle on one browser page
#[derive(Debug, Clone)]
pub struct Page {
    driver: Arc<dyn PageDriver>,
    clock: Arc<dyn Clock>,
    resolver: SelectorResolver,
    detector: ReadinessDetector,
    base_url: String,
    navigation: ReadinessOptions,
    screenshot_dir: PathBuf,
}

impl Page {
    /// Wrap a driver using suite configuration
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, clock: Arc<dyn Clock>, config: &SuiteConfig) -> Self {
        let resolver = SelectorResolver::new(Arc::clone(&clock))
            .with_probe_timeout(config.timeouts.probe())
            .with_poll_interval(config.timeouts.poll());
        Self {
            driver,
            detector: ReadinessDetector::new(Arc::clone(&clock)),
            clock,
            resolver,
            base_url: config.base_url.clone(),
            navigation: ReadinessOptions::from_config(config),
            screenshot_dir: config.artifacts.screenshot_dir.clone(),
        }
    }

    /// Raw driver
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// Resolver used for targets
    #[must_use]
    pub const fn resolver(&self) -> &SelectorResolver {
        &self.resolver
    }

    /// Options used after navigation
    #[must_use]
    pub const fn navigation_options(&self) -> &ReadinessOptions {
        &self.navigation
    }

    /// Screenshot output directory
    #[must_use]
    pub fn screenshot_dir(&self) -> &Path {
        &self.screenshot_dir
    }

    /// Join `path` onto the base origin; absolute URLs pass through
    #[must_use]
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn driver_error(
        &self,
        action: &'static str,
        target: &str,
        start: Duration,
        source: DriverError,
    ) -> ProbeError {
        ProbeError::Driver {
            action,
            context: FailureContext::new(
                target,
                self.clock.since(start),
                self.driver.current_url().await.ok(),
            ),
            source,
        }
    }

    /// Navigate and wait for the load state and loading indicators
    ///
    /// # Errors
    ///
    /// - `NavigationError` if the driver rejects the navigation
    /// - `NavigationTimeout` / `ReadinessTimeout` if the page does not settle
    pub async fn navigate(&self, path: &str) -> Result<String> {
        let url = self.resolve_url(path);
        info!(url = %url, "navigate");
        self.driver
            .goto(&url)
            .await
            .map_err(|source| ProbeError::NavigationError {
                url: url.clone(),
                source,
            })?;
        let elapsed = self
            .detector
            .await_navigation(self.driver.as_ref(), &self.navigation)
            .await?;
        debug!(url = %url, elapsed_ms = elapsed.as_millis() as u64, "navigation settled");
        Ok(url)
    }

    /// Resolve a required target
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when no candidate is visible
    pub async fn locate(&self, target: &CandidateList) -> Result<Strategy> {
        self.resolver.require(self.driver.as_ref(), target).await
    }

    /// Click a target
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` or a wrapped driver error
    pub async fn click(&self, target: &CandidateList) -> Result<()> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        debug!(concept = %target.concept, strategy = %strategy, "click");
        if let Err(source) = self.driver.click(&strategy).await {
            return Err(self.driver_error("click", &target.concept, start, source).await);
        }
        Ok(())
    }

    /// Type into a target and verify the read-back
    ///
    /// # Errors
    ///
    /// Returns `VerificationMismatch` when the value read back differs
    pub async fn type_text(&self, target: &CandidateList, text: &str) -> Result<()> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        debug!(concept = %target.concept, strategy = %strategy, "type");
        if let Err(source) = self.driver.fill(&strategy, text).await {
            return Err(self.driver_error("type", &target.concept, start, source).await);
        }
        let actual = match self.driver.input_value(&strategy).await {
            Ok(value) => value,
            Err(source) => {
                return Err(self.driver_error("read back", &target.concept, start, source).await)
            }
        };
        if actual != text {
            return Err(ProbeError::VerificationMismatch {
                target: target.concept.clone(),
                expected: text.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Press a key with focus on a target
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` or a wrapped driver error
    pub async fn press(&self, target: &CandidateList, key: &str) -> Result<()> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        if let Err(source) = self.driver.press(&strategy, key).await {
            return Err(self.driver_error("press", &target.concept, start, source).await);
        }
        Ok(())
    }

    /// Select an option of a `<select>` target
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when the select or the option is
    /// missing, or a wrapped driver error
    pub async fn select_option(&self, target: &CandidateList, option: &str) -> Result<()> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        match self.driver.select_option(&strategy, option).await {
            Ok(()) => Ok(()),
            Err(DriverError::NoSuchOption { .. }) => {
                debug!(concept = %target.concept, option, "option not offered");
                Err(ProbeError::ElementNotAvailable {
                    concept: format!("{} option {option:?}", target.concept),
                    tried: target.len(),
                    context: FailureContext::new(
                        target.concept.clone(),
                        self.clock.since(start),
                        self.driver.current_url().await.ok(),
                    ),
                })
            }
            Err(source) => Err(self.driver_error("select", &target.concept, start, source).await),
        }
    }

    /// Trimmed text of a target; empty when it has none
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when the target is missing
    pub async fn read_text(&self, target: &CandidateList) -> Result<String> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        match self.driver.text_content(&strategy).await {
            Ok(text) => Ok(text.map(|t| t.trim().to_string()).unwrap_or_default()),
            Err(source) => Err(self.driver_error("read text", &target.concept, start, source).await),
        }
    }

    /// Trimmed texts of every match of the first candidate that matches anything
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn read_all_texts(&self, target: &CandidateList) -> Result<Vec<String>> {
        let start = self.clock.now();
        for strategy in target.iter() {
            match self.driver.all_text_contents(strategy).await {
                Ok(texts) if texts.is_empty() => {}
                Ok(texts) => return Ok(texts.iter().map(|t| t.trim().to_string()).collect()),
                Err(source) => {
                    return Err(self.driver_error("read texts", &target.concept, start, source).await)
                }
            }
        }
        Ok(Vec::new())
    }

    /// Whether a target becomes visible within `timeout`; never fails
    ///
    /// `timeout` bounds the whole call and is split evenly across the
    /// candidates.
    pub async fn is_visible(&self, target: &CandidateList, timeout: Duration) -> bool {
        if target.is_empty() {
            return false;
        }
        let per_candidate = timeout / u32::try_from(target.len()).unwrap_or(u32::MAX);
        self.resolver
            .resolve_within(self.driver.as_ref(), target, per_candidate)
            .await
            .found
    }

    /// Match count of the first candidate matching anything, or 0
    pub async fn count(&self, target: &CandidateList) -> usize {
        readiness::count_matches(self.driver.as_ref(), target).await
    }

    /// Attribute of a resolved target
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` or a wrapped driver error
    pub async fn attribute(&self, target: &CandidateList, name: &str) -> Result<Option<String>> {
        let start = self.clock.now();
        let strategy = self.locate(target).await?;
        match self.driver.attribute(&strategy, name).await {
            Ok(value) => Ok(value),
            Err(source) => Err(self.driver_error("read attribute", &target.concept, start, source).await),
        }
    }

    /// Capture a screenshot to `{screenshot_dir}/{label}-{unix_ms}.png`
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error or `Screenshot` if the file cannot be written
    pub async fn screenshot(&self, label: &str) -> Result<PathBuf> {
        let start = self.clock.now();
        let png = match self.driver.screenshot().await {
            Ok(png) => png,
            Err(source) => return Err(self.driver_error("screenshot", label, start, source).await),
        };
        let path = artifacts::write_screenshot(&self.screenshot_dir, label, &png).await?;
        info!(label, path = %path.display(), "screenshot saved");
        Ok(path)
    }

    /// Resize the viewport
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let start = self.clock.now();
        debug!(viewport = %viewport, "set viewport");
        if let Err(source) = self.driver.set_viewport(viewport).await {
            return Err(self.driver_error("set viewport", &viewport.to_string(), start, source).await);
        }
        Ok(())
    }

    /// Layout measurements
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn layout_metrics(&self) -> Result<LayoutMetrics> {
        let start = self.clock.now();
        match self.driver.layout_metrics().await {
            Ok(metrics) => Ok(metrics),
            Err(source) => Err(self.driver_error("measure layout", "document", start, source).await),
        }
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn title(&self) -> Result<String> {
        let start = self.clock.now();
        match self.driver.title().await {
            Ok(title) => Ok(title),
            Err(source) => Err(self.driver_error("read title", "document", start, source).await),
        }
    }

    /// Current URL
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn current_url(&self) -> Result<String> {
        self.driver
            .current_url()
            .await
            .map_err(|source| ProbeError::Driver {
                action: "read url",
                context: FailureContext::new("document", Duration::ZERO, None),
                source,
            })
    }

    /// Run the full readiness gate
    ///
    /// # Errors
    ///
    /// See [`ReadinessDetector::await_ready`]
    pub async fn await_ready(&self, options: &ReadinessOptions) -> Result<ReadinessReport> {
        self.detector.await_ready(self.driver.as_ref(), options).await
    }

    /// Wait for the load state and loading indicators of the current document
    ///
    /// # Errors
    ///
    /// See [`ReadinessDetector::await_navigation`]
    pub async fn await_navigation(&self) -> Result<Duration> {
        self.detector
            .await_navigation(self.driver.as_ref(), &self.navigation)
            .await
    }

    /// Close the page
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn close(&self) -> Result<()> {
        let start = self.clock.now();
        match self.driver.close().await {
            Ok(()) => Ok(()),
            Err(source) => Err(self.driver_error("close", "page", start, source).await),
        }
    }
}
