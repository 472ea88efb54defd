//! Mentoring scenarios.
//!
//! Each scenario starts from a fresh page and a fresh navigation. Optional
//! affordances that are missing turn into [`ScenarioOutcome::Skipped`] via
//! [`skip_if_unavailable`]; every other error is a failure.

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::config::{Viewport, ViewportPresets};
use crate::mentoring::MentoringPage;
use crate::result::{ErrorKind, ProbeError, Result};

/// Result of running one scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// All expectations held
    Passed,
    /// An optional affordance was absent
    Skipped {
        /// Why the scenario was skipped
        reason: String,
    },
    /// The scenario failed
    Failed {
        /// Failure kind
        kind: ErrorKind,
        /// Failure message
        message: String,
    },
}

impl ScenarioOutcome {
    /// Fold a scenario result into an outcome
    #[must_use]
    pub fn from_result(result: Result<Self>) -> Self {
        match result {
            Ok(outcome) => outcome,
            Err(err) => Self::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }

    /// Check if outcome is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Turn exactly `ElementNotAvailable` into a skip; everything else propagates
///
/// # Errors
///
/// Returns the original error for every other kind
pub fn skip_if_unavailable(result: Result<ScenarioOutcome>) -> Result<ScenarioOutcome> {
    match result {
        Err(err) if err.is_element_unavailable() => {
            let reason = err.to_string();
            info!(reason = %reason, "skipping: optional element unavailable");
            Ok(ScenarioOutcome::Skipped { reason })
        }
        other => other,
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message()))
    }
}

/// Viewport a scenario runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportKind {
    /// Desktop preset
    Desktop,
    /// Tablet preset
    Tablet,
    /// Mobile preset
    Mobile,
}

impl ViewportKind {
    /// Resolve against the presets
    #[must_use]
    pub const fn resolve(self, presets: &ViewportPresets) -> Viewport {
        match self {
            Self::Desktop => presets.desktop,
            Self::Tablet => presets.tablet,
            Self::Mobile => presets.mobile,
        }
    }
}

/// The mentoring scenario suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Page opens with a mentoring title and enough content
    PageLoads,
    /// A known keyword returns at least one mentor
    SearchReturnsResults,
    /// An empty keyword is rejected before touching the page
    EmptySearchRejected,
    /// A category filter can be applied
    FilterByCategory,
    /// The first mentor card opens a profile
    OpenFirstMentor,
    /// No horizontal overflow on a phone viewport
    ResponsiveMobile,
    /// No horizontal overflow on a tablet viewport
    ResponsiveTablet,
    /// Main landmark, image alt text and a labelled search input
    AccessibilityLandmarks,
    /// An unknown route shows an error page or redirects
    UnknownRouteHandled,
}

impl Scenario {
    /// Every scenario, in execution order
    pub const ALL: [Self; 9] = [
        Self::PageLoads,
        Self::SearchReturnsResults,
        Self::EmptySearchRejected,
        Self::FilterByCategory,
        Self::OpenFirstMentor,
        Self::ResponsiveMobile,
        Self::ResponsiveTablet,
        Self::AccessibilityLandmarks,
        Self::UnknownRouteHandled,
    ];

    /// Stable scenario name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PageLoads => "page_loads",
            Self::SearchReturnsResults => "search_returns_results",
            Self::EmptySearchRejected => "empty_search_rejected",
            Self::FilterByCategory => "filter_by_category",
            Self::OpenFirstMentor => "open_first_mentor",
            Self::ResponsiveMobile => "responsive_mobile",
            Self::ResponsiveTablet => "responsive_tablet",
            Self::AccessibilityLandmarks => "accessibility_landmarks",
            Self::UnknownRouteHandled => "unknown_route_handled",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::PageLoads => "mentoring page loads with a matching title and content",
            Self::SearchReturnsResults => "searching a known keyword returns mentors",
            Self::EmptySearchRejected => "an empty search keyword is rejected",
            Self::FilterByCategory => "a category filter narrows the results",
            Self::OpenFirstMentor => "the first mentor card opens a profile",
            Self::ResponsiveMobile => "layout fits a mobile viewport",
            Self::ResponsiveTablet => "layout fits a tablet viewport",
            Self::AccessibilityLandmarks => "landmarks, alt text and search label are present",
            Self::UnknownRouteHandled => "unknown routes show an error page",
        }
    }

    /// Viewport the scenario's page is opened at
    #[must_use]
    pub const fn viewport_kind(&self) -> ViewportKind {
        match self {
            Self::ResponsiveMobile => ViewportKind::Mobile,
            Self::ResponsiveTablet => ViewportKind::Tablet,
            _ => ViewportKind::Desktop,
        }
    }

    /// Run against a freshly opened page
    pub async fn run(self, mentoring: &MentoringPage) -> ScenarioOutcome {
        info!(scenario = self.name(), "scenario started");
        let outcome = ScenarioOutcome::from_result(self.execute(mentoring).await);
        info!(scenario = self.name(), outcome = ?outcome, "scenario finished");
        outcome
    }

    async fn execute(self, mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
        match self {
            Self::PageLoads => page_loads(mentoring).await,
            Self::SearchReturnsResults => skip_if_unavailable(search_returns_results(mentoring).await),
            Self::EmptySearchRejected => empty_search_rejected(mentoring).await,
            Self::FilterByCategory => skip_if_unavailable(filter_by_category(mentoring).await),
            Self::OpenFirstMentor => skip_if_unavailable(open_first_mentor(mentoring).await),
            Self::ResponsiveMobile | Self::ResponsiveTablet => responsive(self, mentoring).await,
            Self::AccessibilityLandmarks => accessibility_landmarks(mentoring).await,
            Self::UnknownRouteHandled => unknown_route_handled(mentoring).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ProbeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| ProbeError::invalid_input(format!("unknown scenario {s:?}")))
    }
}

async fn page_loads(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let _ = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    Ok(ScenarioOutcome::Passed)
}

async fn search_returns_results(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let _ = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    let keyword = &mentoring.config().fixtures.search_keyword;
    let count = mentoring.search_mentors(keyword).await?;
    ensure(count > 0, || format!("search for {keyword:?} returned no mentors"))?;
    Ok(ScenarioOutcome::Passed)
}

async fn empty_search_rejected(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let _ = mentoring.open().await?;
    match mentoring.search_mentors("   ").await {
        Err(err) if err.kind() == ErrorKind::InvalidInput => Ok(ScenarioOutcome::Passed),
        Err(err) => Err(err),
        Ok(count) => Err(ProbeError::assertion(format!(
            "empty search was accepted and returned {count} mentor(s)"
        ))),
    }
}

async fn filter_by_category(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let _ = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    let before = mentoring.get_mentor_count().await;
    let after = mentoring
        .filter_by_category(&mentoring.config().fixtures.category)
        .await?;
    ensure(after <= before || before == 0, || {
        format!("filtering grew the result list from {before} to {after}")
    })?;
    Ok(ScenarioOutcome::Passed)
}

async fn open_first_mentor(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let listing = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    let profile = mentoring.click_first_mentor().await?;
    ensure(profile != listing, || {
        format!("clicking the first mentor stayed on {listing}")
    })?;
    Ok(ScenarioOutcome::Passed)
}

async fn responsive(scenario: Scenario, mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let viewport = scenario
        .viewport_kind()
        .resolve(&mentoring.config().viewports);
    let _ = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    let metrics = mentoring.page().layout_metrics().await?;
    ensure(metrics.viewport_width == viewport.width, || {
        format!(
            "expected a {}px wide viewport, page reports {}px",
            viewport.width, metrics.viewport_width
        )
    })?;
    ensure(!metrics.has_horizontal_overflow(), || {
        format!(
            "content is {}px wide in a {}px viewport",
            metrics.scroll_width, metrics.viewport_width
        )
    })?;
    Ok(ScenarioOutcome::Passed)
}

async fn accessibility_landmarks(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let _ = mentoring.open().await?;
    let _ = mentoring.verify_page_loaded().await?;
    ensure(mentoring.has_main_landmark().await, || {
        "page has no main landmark".to_string()
    })?;
    let missing = mentoring.images_missing_alt().await;
    ensure(missing == 0, || format!("{missing} image(s) without alt text"))?;

    skip_if_unavailable(async {
        let label = mentoring.search_input_label().await?;
        ensure(label.is_some(), || "search input has no accessible label".to_string())?;
        Ok(ScenarioOutcome::Passed)
    }
    .await)
}

async fn unknown_route_handled(mentoring: &MentoringPage) -> Result<ScenarioOutcome> {
    let route = &mentoring.config().fixtures.unknown_route;
    let requested = mentoring.page().navigate(route).await?;
    let landed = mentoring.page().current_url().await?;
    let redirected = landed != requested;
    let error_page = mentoring.shows_error_page().await?;
    ensure(redirected || error_page, || {
        format!("{route} rendered as a normal page")
    })?;
    Ok(ScenarioOutcome::Passed)
}
