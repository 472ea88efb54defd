//! Mentorprobe: resilient element location and readiness detection for
//! end-to-end tests of the mentoring pages.
//!
//! Every logical UI concept (search input, mentor card, category filter) is
//! described by an ordered [`CandidateList`] of locator strategies. The
//! [`SelectorResolver`] picks the first visible candidate, the
//! [`ReadinessDetector`] decides when a page is usable, and the scenario
//! suite runs on top of both through the [`PageDriver`] seam.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  MENTORPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Mentoring  │    │ Page       │            │
//! │   │ Runner     │───►│ Page       │───►│ Facade     │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │                    │
//! │              ┌──────────────────┬───────────┘                    │
//! │              ▼                  ▼                                │
//! │   ┌────────────────┐   ┌─────────────────┐                       │
//! │   │ Selector       │   │ Readiness       │                       │
//! │   │ Resolver       │   │ Detector        │                       │
//! │   └───────┬────────┘   └────────┬────────┘                       │
//! │           └──────────┬──────────┘                                │
//! │                      ▼                                           │
//! │             ┌─────────────────┐                                  │
//! │             │ PageDriver      │  chromium (CDP) | fake           │
//! │             └─────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mentorprobe::prelude::*;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let clock = FakeClock::shared();
//!     let driver = FakeDriver::new(clock.clone());
//!     driver.add_element(Strategy::test_id("mentor-search"), FakeElement::new());
//!
//!     let resolver = SelectorResolver::new(clock);
//!     let config = SuiteConfig::default();
//!     let result = resolver.resolve(&driver, &config.selectors.search_input).await;
//!     assert!(result.found);
//! });
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Error taxonomy and result aliases
mod result;

/// Injectable time source
pub mod clock;

/// Locator strategies and candidate lists
pub mod locator;

/// Browser seam
#[allow(clippy::missing_errors_doc)]
pub mod driver;

/// Profiles, timeouts, viewports and the selector catalog
pub mod config;

/// Scripted in-memory driver for tests
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod fake;

/// First-visible-wins candidate resolution
pub mod resolver;

/// Page readiness pipeline
pub mod readiness;

/// Screenshots and run reports
pub mod artifacts;

/// Page facade over a driver
pub mod page;

/// Mentoring page object
pub mod mentoring;

/// Mentoring scenario suite
pub mod scenario;

/// Sequential scenario runner
pub mod runner;

/// Chromium driver over CDP
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod chromium;

pub use artifacts::{RunReport, ScenarioRecord, ScenarioStatus};
#[cfg(feature = "browser")]
pub use chromium::{ChromiumDriver, ChromiumLauncher, LaunchOptions};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ArtifactConfig, BrowserEngine, Heuristics, Profile, RetryPolicy, ScenarioFixtures,
    SelectorCatalog, SuiteConfig, TimeoutTiers, Viewport, ViewportPresets,
};
pub use driver::{DocumentState, LayoutMetrics, PageDriver, PageLauncher};
pub use fake::{FakeDriver, FakeElement, FakeLauncher, FakeRoute};
pub use locator::{CandidateList, Strategy};
pub use mentoring::MentoringPage;
pub use page::Page;
pub use readiness::{
    LoadState, ReadinessDetector, ReadinessOptions, ReadinessPhase, ReadinessReport,
    ReadinessSignals, StabilizationSample, NETWORK_IDLE_THRESHOLD_MS,
};
pub use resolver::{ProbeResult, SelectorResolver, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT};
pub use result::{DriverError, DriverResult, ErrorKind, FailureContext, ProbeError, Result};
pub use runner::{RunObserver, RunOptions, ScenarioRunner, SilentObserver};
pub use scenario::{skip_if_unavailable, Scenario, ScenarioOutcome, ViewportKind};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::artifacts::*;
    #[cfg(feature = "browser")]
    pub use super::chromium::*;
    pub use super::clock::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::fake::*;
    pub use super::locator::*;
    pub use super::mentoring::*;
    pub use super::page::*;
    pub use super::readiness::*;
    pub use super::resolver::*;
    pub use super::result::{DriverError, ErrorKind, FailureContext, ProbeError};
    pub use super::runner::*;
    pub use super::scenario::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    mod reexport_tests {
        use super::*;

        #[test]
        fn test_error_kinds_are_stable() {
            let err = ProbeError::invalid_input("keyword cannot be empty");
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(ErrorKind::ElementNotAvailable.as_str(), "element_not_available");
        }

        #[test]
        fn test_default_config_validates() {
            assert!(SuiteConfig::default().validate().is_ok());
        }
    }
}
