//! Suite configuration.
//!
//! One immutable [`SuiteConfig`] is resolved per process and shared by
//! reference. Resolution order:
//!
//! 1. built-in profile selected by `TEST_ENV` (default `development`)
//! 2. optional YAML overlay file, merged key by key
//! 3. `BASE_URL` environment override

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::locator::{CandidateList, Strategy};
use crate::result::{ProbeError, Result};

/// Environment variable selecting the profile
pub const PROFILE_ENV: &str = "TEST_ENV";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Environment variable marking a CI run
pub const CI_ENV: &str = "CI";

/// Named configuration profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Local development server
    #[default]
    Development,
    /// Staging deployment
    Staging,
    /// Production deployment
    Production,
}

impl Profile {
    /// Resolve the profile from an environment lookup, defaulting to development
    ///
    /// # Errors
    ///
    /// Returns a config error when the variable names no known profile
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(PROFILE_ENV) {
            Some(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Self::Development),
        }
    }

    /// Profile name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Profile {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ProbeError::config(format!(
                "unknown profile {other:?} (expected development, staging or production)"
            ))),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timeout tiers, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutTiers {
    /// Quick checks
    pub short_ms: u64,
    /// Typical element waits
    pub medium_ms: u64,
    /// Slow interactions (search round-trips)
    pub long_ms: u64,
    /// Navigation settle bound
    pub page_load_ms: u64,
    /// Backend-driven updates
    pub api_ms: u64,
    /// Per-candidate visibility probe
    pub probe_ms: u64,
    /// Polling interval for all waits
    pub poll_ms: u64,
    /// Delay between stabilization samples
    pub settle_ms: u64,
}

impl TimeoutTiers {
    /// Per-candidate probe timeout
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    /// Polling interval
    #[must_use]
    pub const fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    /// Emulate a mobile device
    #[serde(default)]
    pub mobile: bool,
}

impl Viewport {
    /// Create a desktop-class viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mobile: false,
        }
    }

    /// Mark as mobile
    #[must_use]
    pub const fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Viewport presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportPresets {
    /// Desktop
    pub desktop: Viewport,
    /// Tablet
    pub tablet: Viewport,
    /// Mobile
    pub mobile: Viewport,
}

impl Default for ViewportPresets {
    fn default() -> Self {
        Self {
            desktop: Viewport::new(1920, 1080),
            tablet: Viewport::new(768, 1024).with_mobile(true),
            mobile: Viewport::new(375, 667).with_mobile(true),
        }
    }
}

/// Browser engine a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// Chromium (driven over CDP)
    Chromium,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
}

impl BrowserEngine {
    /// Engine name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserEngine {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" | "safari" => Ok(Self::Webkit),
            other => Err(ProbeError::config(format!("unknown browser engine {other:?}"))),
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry counts for failed scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries when running under CI
    pub ci: u32,
    /// Retries on a developer machine
    pub local: u32,
}

impl RetryPolicy {
    /// Retries for the current environment
    #[must_use]
    pub const fn effective(&self, on_ci: bool) -> u32 {
        if on_ci {
            self.ci
        } else {
            self.local
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { ci: 2, local: 0 }
    }
}

/// Artifact capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Capture a screenshot when a scenario fails
    pub screenshots: bool,
    /// Request video capture from the launcher
    pub video: bool,
    /// Screenshot output directory
    pub screenshot_dir: PathBuf,
    /// Results output directory
    pub results_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            screenshots: true,
            video: false,
            screenshot_dir: PathBuf::from("target/mentorprobe/screenshots"),
            results_dir: PathBuf::from("target/mentorprobe/results"),
        }
    }
}

/// Candidate lists for every UI concept the suite touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCatalog {
    /// Page heading
    pub heading: CandidateList,
    /// Search input
    pub search_input: CandidateList,
    /// Result cards
    pub mentor_cards: CandidateList,
    /// Name element inside a card
    pub mentor_names: CandidateList,
    /// Link to a mentor's profile inside a card
    pub mentor_links: CandidateList,
    /// "No results" indicator
    pub no_results: CandidateList,
    /// Loading indicators drained before content checks
    pub loading_indicators: Vec<Strategy>,
    /// Containers whose buttons are category filters
    pub category_containers: Vec<String>,
    /// Category `<select>` controls
    pub category_select: CandidateList,
    /// Main landmark
    pub main_landmark: CandidateList,
    /// Error message shown for unknown routes
    pub error_message: CandidateList,
}

impl SelectorCatalog {
    /// Candidate list for a named category filter control
    #[must_use]
    pub fn category_filter(&self, category: &str) -> CandidateList {
        let mut list = CandidateList::new(format!("category filter '{category}'"));
        for container in &self.category_containers {
            list = list.or(Strategy::css_with_text(
                format!("{container} button, {container} a, {container} label"),
                category,
            ));
        }
        list.or(Strategy::role("button", Some(category)))
            .or(Strategy::role("tab", Some(category)))
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            heading: CandidateList::new("page heading")
                .or(Strategy::test_id("page-title"))
                .or(Strategy::css("h1"))
                .or(Strategy::role("heading", None)),
            search_input: CandidateList::new("search input")
                .or(Strategy::test_id("mentor-search"))
                .or(Strategy::css("input[type='search']"))
                .or(Strategy::css("input[name='search']"))
                .or(Strategy::placeholder("Search"))
                .or(Strategy::role("searchbox", None)),
            mentor_cards: CandidateList::new("mentor cards")
                .or(Strategy::test_id("mentor-card"))
                .or(Strategy::css(".mentor-card"))
                .or(Strategy::css("[class*='MentorCard']"))
                .or(Strategy::css("main article")),
            mentor_names: CandidateList::new("mentor names")
                .or(Strategy::test_id("mentor-name"))
                .or(Strategy::css(".mentor-card .mentor-name"))
                .or(Strategy::css(".mentor-card h3"))
                .or(Strategy::css("main article h3")),
            mentor_links: CandidateList::new("mentor profile link")
                .or(Strategy::css("[data-testid='mentor-card'] a"))
                .or(Strategy::css(".mentor-card a"))
                .or(Strategy::test_id("mentor-card"))
                .or(Strategy::css("main article a")),
            no_results: CandidateList::new("no results indicator")
                .or(Strategy::test_id("no-results"))
                .or(Strategy::css(".no-results"))
                .or(Strategy::text("No mentors found"))
                .or(Strategy::text("No results")),
            loading_indicators: vec![
                Strategy::test_id("loading"),
                Strategy::css(".spinner"),
                Strategy::css(".loading"),
                Strategy::css("[aria-busy='true']"),
            ],
            category_containers: vec![
                "[data-testid='category-filter']".to_string(),
                ".category-filter".to_string(),
                ".filters".to_string(),
            ],
            category_select: CandidateList::new("category select")
                .or(Strategy::test_id("category-select"))
                .or(Strategy::css("select[name='category']")),
            main_landmark: CandidateList::new("main landmark")
                .or(Strategy::css("main"))
                .or(Strategy::role("main", None)),
            error_message: CandidateList::new("error message")
                .or(Strategy::test_id("error-page"))
                .or(Strategy::css(".error-page"))
                .or(Strategy::text("not found"))
                .or(Strategy::text("Not Found"))
                .or(Strategy::text("404")),
        }
    }
}

/// Product-specific heuristics, kept configurable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Minimum rendered words before a page counts as non-blank
    pub min_content_words: usize,
    /// Maximum words in something that looks like a person's name
    pub max_name_words: usize,
    /// Phrases that disqualify a line from being a name (case-insensitive)
    pub marketing_phrases: Vec<String>,
}

impl Heuristics {
    /// Whether `text` looks like a person's name.
    ///
    /// Literal heuristic: non-empty, at most `max_name_words` words, and
    /// containing none of the marketing phrases.
    #[must_use]
    pub fn looks_like_person_name(&self, text: &str) -> bool {
        let words = text.split_whitespace().count();
        if words == 0 || words > self.max_name_words {
            return false;
        }
        let lower = text.to_lowercase();
        !self
            .marketing_phrases
            .iter()
            .any(|phrase| lower.contains(&phrase.to_lowercase()))
    }
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            min_content_words: 20,
            max_name_words: 4,
            marketing_phrases: [
                "learn more",
                "view profile",
                "book a session",
                "get started",
                "find a mentor",
                "become a mentor",
                "sign up",
                "read more",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

/// Inputs the scenarios feed to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFixtures {
    /// Keyword expected to return results
    pub search_keyword: String,
    /// Category expected to exist
    pub category: String,
    /// Path expected to be unknown to the application
    pub unknown_route: String,
}

impl Default for ScenarioFixtures {
    fn default() -> Self {
        Self {
            search_keyword: "engineering".to_string(),
            category: "Design".to_string(),
            unknown_route: "/mentoring/this-route-does-not-exist".to_string(),
        }
    }
}

/// Complete configuration bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Selected profile
    pub profile: Profile,
    /// Target origin
    pub base_url: String,
    /// Path of the mentoring page
    pub mentoring_path: String,
    /// Timeout tiers
    pub timeouts: TimeoutTiers,
    /// Viewport presets
    pub viewports: ViewportPresets,
    /// Engines to run against
    pub browsers: Vec<BrowserEngine>,
    /// Retry counts
    pub retries: RetryPolicy,
    /// Artifact capture
    pub artifacts: ArtifactConfig,
    /// Selector catalog
    pub selectors: SelectorCatalog,
    /// Heuristics
    pub heuristics: Heuristics,
    /// Scenario inputs
    pub fixtures: ScenarioFixtures,
}

impl SuiteConfig {
    /// Built-in configuration for a profile
    #[must_use]
    pub fn for_profile(profile: Profile) -> Self {
        let (base_url, timeouts, browsers) = match profile {
            Profile::Development => (
                "http://localhost:3000",
                TimeoutTiers {
                    short_ms: 2_000,
                    medium_ms: 5_000,
                    long_ms: 15_000,
                    page_load_ms: 30_000,
                    api_ms: 10_000,
                    probe_ms: 1_500,
                    poll_ms: 100,
                    settle_ms: 500,
                },
                vec![BrowserEngine::Chromium],
            ),
            Profile::Staging => (
                "https://staging.mentoring.example.com",
                TimeoutTiers {
                    short_ms: 3_000,
                    medium_ms: 8_000,
                    long_ms: 20_000,
                    page_load_ms: 45_000,
                    api_ms: 15_000,
                    probe_ms: 2_000,
                    poll_ms: 100,
                    settle_ms: 750,
                },
                vec![
                    BrowserEngine::Chromium,
                    BrowserEngine::Firefox,
                    BrowserEngine::Webkit,
                ],
            ),
            Profile::Production => (
                "https://mentoring.example.com",
                TimeoutTiers {
                    short_ms: 3_000,
                    medium_ms: 10_000,
                    long_ms: 30_000,
                    page_load_ms: 60_000,
                    api_ms: 20_000,
                    probe_ms: 2_000,
                    poll_ms: 150,
                    settle_ms: 1_000,
                },
                vec![
                    BrowserEngine::Chromium,
                    BrowserEngine::Firefox,
                    BrowserEngine::Webkit,
                ],
            ),
        };

        Self {
            profile,
            base_url: base_url.to_string(),
            mentoring_path: "/mentoring".to_string(),
            timeouts,
            viewports: ViewportPresets::default(),
            browsers,
            retries: RetryPolicy::default(),
            artifacts: ArtifactConfig::default(),
            selectors: SelectorCatalog::default(),
            heuristics: Heuristics::default(),
            fixtures: ScenarioFixtures::default(),
        }
    }

    /// Resolve configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if the profile is unknown or the overlay is invalid
    pub fn load(profile: Option<&str>, overlay: Option<&Path>) -> Result<Self> {
        Self::load_with(profile, overlay, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an injectable environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the profile is unknown or the overlay is invalid
    pub fn load_with<F>(profile: Option<&str>, overlay: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match profile {
            Some(name) => name.parse()?,
            None => Profile::from_lookup(&lookup)?,
        };

        let mut config = Self::for_profile(profile);

        if let Some(path) = overlay {
            let text = std::fs::read_to_string(path)?;
            config = config.with_yaml_overlay(&text)?;
        }

        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        config.validate()?;
        tracing::debug!(profile = %config.profile, base_url = %config.base_url, "configuration resolved");
        Ok(config)
    }

    /// Merge a YAML document over this configuration, key by key
    ///
    /// # Errors
    ///
    /// Returns a config error if the YAML is malformed or has the wrong shape
    pub fn with_yaml_overlay(self, yaml: &str) -> Result<Self> {
        let overlay: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)
            .map_err(|e| ProbeError::config(format!("invalid config overlay: {e}")))?;
        let mut base = serde_yaml_ng::to_value(&self)
            .map_err(|e| ProbeError::config(format!("cannot serialize configuration: {e}")))?;
        merge_yaml(&mut base, overlay);
        serde_yaml_ng::from_value(base)
            .map_err(|e| ProbeError::config(format!("invalid config overlay: {e}")))
    }

    /// Check invariants the rest of the suite relies on
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first violation
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) origin, got {:?}",
                self.base_url
            )));
        }
        if self.timeouts.poll_ms == 0 {
            return Err(ProbeError::config("timeouts.poll_ms must be positive"));
        }
        if self.browsers.is_empty() {
            return Err(ProbeError::config("at least one browser engine is required"));
        }
        Ok(())
    }

    /// Whether the current process runs under CI
    #[must_use]
    pub fn on_ci_with<F>(lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(CI_ENV).is_some_and(|v| !v.is_empty() && v != "0" && v != "false")
    }

    /// Retries for this process
    #[must_use]
    pub fn effective_retries(&self) -> u32 {
        self.retries
            .effective(Self::on_ci_with(|key| std::env::var(key).ok()))
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Development)
    }
}

/// Recursively merge `overlay` into `base`; mappings merge, everything else replaces
fn merge_yaml(base: &mut serde_yaml_ng::Value, overlay: serde_yaml_ng::Value) {
    use serde_yaml_ng::Value;
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        let _ = base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
