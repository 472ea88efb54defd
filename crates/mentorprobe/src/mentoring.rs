//! Mentoring page object.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::locator::Strategy;
use crate::page::Page;
use crate::readiness::{ReadinessOptions, ReadinessReport};
use crate::result::{ProbeError, Result};

/// Fragment the page title must contain (case-insensitive)
pub const TITLE_FRAGMENT: &str = "mentor";

/// Message of the empty-keyword error
pub const EMPTY_KEYWORD: &str = "keyword cannot be empty";

/// Page object for the mentoring feature
#[derive(Debug, Clone)]
pub struct MentoringPage {
    page: Page,
    config: Arc<SuiteConfig>,
}

impl MentoringPage {
    /// Wrap a page
    #[must_use]
    pub fn new(page: Page, config: Arc<SuiteConfig>) -> Self {
        Self { page, config }
    }

    /// Underlying page facade
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Navigate to the mentoring page
    ///
    /// # Errors
    ///
    /// Returns navigation errors from [`Page::navigate`]
    pub async fn open(&self) -> Result<String> {
        self.page.navigate(&self.config.mentoring_path).await
    }

    /// Check the title, then run the full readiness gate
    ///
    /// # Errors
    ///
    /// - `TitleMismatch` when the title lacks "mentor"
    /// - any readiness error
    pub async fn verify_page_loaded(&self) -> Result<ReadinessReport> {
        let title = self.page.title().await?;
        if !title.to_lowercase().contains(TITLE_FRAGMENT) {
            return Err(ProbeError::TitleMismatch {
                expected: TITLE_FRAGMENT.to_string(),
                actual: title,
            });
        }
        let report = self
            .page
            .await_ready(&ReadinessOptions::from_config(&self.config))
            .await?;
        info!(title = %title, words = report.words, "mentoring page loaded");
        Ok(report)
    }

    fn results_options(&self) -> ReadinessOptions {
        ReadinessOptions::from_config(&self.config)
            .with_min_content_words(0)
            .with_count_target(self.config.selectors.mentor_cards.clone())
    }

    /// Search for mentors and wait for the results to settle
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty or whitespace keyword, before touching the page
    /// - `ElementNotAvailable` when there is no search input
    pub async fn search_mentors(&self, keyword: &str) -> Result<usize> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ProbeError::invalid_input(EMPTY_KEYWORD));
        }

        let input = &self.config.selectors.search_input;
        self.page.type_text(input, keyword).await?;
        self.page.press(input, "Enter").await?;
        let report = self.page.await_ready(&self.results_options()).await?;
        debug!(keyword, settled = ?report.stable_count(), "search settled");

        Ok(self.get_mentor_count().await)
    }

    /// Number of visible result cards; 0 when the "no results" indicator shows
    pub async fn get_mentor_count(&self) -> usize {
        let selectors = &self.config.selectors;
        if self.page.is_visible(&selectors.no_results, Duration::ZERO).await {
            debug!("no results indicator visible");
            return 0;
        }
        self.page.count(&selectors.mentor_cards).await
    }

    /// Apply a category filter and wait for the results to settle
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when neither a filter control nor a
    /// category select offering `category` exists
    pub async fn filter_by_category(&self, category: &str) -> Result<usize> {
        let selectors = &self.config.selectors;
        let control = selectors.category_filter(category);

        match self.page.click(&control).await {
            Ok(()) => {}
            Err(err) if err.is_element_unavailable() => {
                if !self
                    .page
                    .is_visible(&selectors.category_select, Duration::ZERO)
                    .await
                {
                    return Err(err);
                }
                match self
                    .page
                    .select_option(&selectors.category_select, category)
                    .await
                {
                    Err(missing) if missing.is_element_unavailable() => return Err(err),
                    other => other?,
                }
            }
            Err(err) => return Err(err),
        }

        let _ = self.page.await_ready(&self.results_options()).await?;
        Ok(self.get_mentor_count().await)
    }

    /// Open the first mentor's profile and return the new URL
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when no mentor card is shown
    pub async fn click_first_mentor(&self) -> Result<String> {
        self.page.click(&self.config.selectors.mentor_links).await?;
        let _ = self.page.await_navigation().await?;
        self.page.current_url().await
    }

    /// Card texts that look like person names
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn mentor_names(&self) -> Result<Vec<String>> {
        let heuristics = &self.config.heuristics;
        let names = self
            .page
            .read_all_texts(&self.config.selectors.mentor_names)
            .await?
            .into_iter()
            .filter(|text| heuristics.looks_like_person_name(text))
            .collect();
        Ok(names)
    }

    /// Whether a search input is shown
    pub async fn has_search_input(&self) -> bool {
        self.page
            .is_visible(
                &self.config.selectors.search_input,
                self.config.timeouts.probe(),
            )
            .await
    }

    /// Trimmed heading text
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when there is no heading
    pub async fn heading_text(&self) -> Result<String> {
        self.page.read_text(&self.config.selectors.heading).await
    }

    /// Whether a main landmark is present
    pub async fn has_main_landmark(&self) -> bool {
        self.page
            .is_visible(&self.config.selectors.main_landmark, Duration::ZERO)
            .await
    }

    /// Number of `<img>` elements without an `alt` attribute
    pub async fn images_missing_alt(&self) -> usize {
        let target = crate::locator::CandidateList::new("images without alt")
            .or(Strategy::css("img:not([alt])"));
        self.page.count(&target).await
    }

    /// Accessible label of the search input (`aria-label`, then `placeholder`)
    ///
    /// # Errors
    ///
    /// Returns `ElementNotAvailable` when there is no search input
    pub async fn search_input_label(&self) -> Result<Option<String>> {
        let input = &self.config.selectors.search_input;
        for name in ["aria-label", "placeholder", "title"] {
            if let Some(label) = self.page.attribute(input, name).await? {
                if !label.trim().is_empty() {
                    return Ok(Some(label));
                }
            }
        }
        Ok(None)
    }

    /// Whether the current page presents itself as an error page
    ///
    /// # Errors
    ///
    /// Returns a wrapped driver error
    pub async fn shows_error_page(&self) -> Result<bool> {
        let title = self.page.title().await?.to_lowercase();
        if title.contains("404") || title.contains("not found") {
            return Ok(true);
        }
        Ok(self
            .page
            .is_visible(&self.config.selectors.error_message, Duration::ZERO)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::fake::{FakeDriver, FakeElement};
    use crate::result::ErrorKind;
    use crate::scenario::{skip_if_unavailable, ScenarioOutcome};

    const BODY: &str = "Mentoring helps you grow. Browse mentors across engineering design \
                        product and data, read their profiles, and book a session with someone \
                        who has done it before.";

    fn setup() -> (Arc<FakeDriver>, MentoringPage) {
        let clock = FakeClock::shared();
        let driver = Arc::new(FakeDriver::new(Arc::clone(&clock)));
        driver.set_title("Find a Mentor | Acme");
        driver.set_body_text(BODY);
        let config = Arc::new(SuiteConfig::default());
        let page = Page::new(driver.clone(), clock, &config);
        (driver, MentoringPage::new(page, config))
    }

    mod load_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_and_verify() {
            let (driver, mentoring) = setup();
            let url = mentoring.open().await.unwrap();
            assert_eq!(url, "http://localhost:3000/mentoring");
            let report = mentoring.verify_page_loaded().await.unwrap();
            assert!(report.signals.min_content_met);
            assert!(driver.was_called("title"));
        }

        #[tokio::test]
        async fn test_404_title_is_title_mismatch() {
            let (driver, mentoring) = setup();
            driver.set_title("404 Not Found");
            driver.set_body_text("404 Not Found");

            let err = mentoring.verify_page_loaded().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TitleMismatch);
            assert!(err.to_string().contains("404 Not Found"));
        }

        #[tokio::test]
        async fn test_title_match_is_case_insensitive() {
            let (driver, mentoring) = setup();
            driver.set_title("MENTORING");
            assert!(mentoring.verify_page_loaded().await.is_ok());
        }
    }

    mod search_tests {
        use super::*;

        #[tokio::test]
        async fn test_empty_keyword_touches_nothing() {
            let (driver, mentoring) = setup();
            for keyword in ["", "   ", "\t\n"] {
                let err = mentoring.search_mentors(keyword).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidInput);
                assert!(err.to_string().contains(EMPTY_KEYWORD));
            }
            assert_eq!(driver.call_count(), 0);
        }

        #[tokio::test]
        async fn test_search_types_submits_and_counts() {
            let (driver, mentoring) = setup();
            driver.add_element(Strategy::test_id("mentor-search"), FakeElement::new());
            driver.add_element(
                Strategy::test_id("mentor-card"),
                FakeElement::new().with_count_samples([2, 5, 5]),
            );

            let count = mentoring.search_mentors("  engineering ").await.unwrap();
            assert_eq!(count, 5);
            assert!(driver.was_called("fill:test_id=mentor-search:engineering"));
            assert!(driver.was_called("press:test_id=mentor-search:Enter"));
        }

        #[tokio::test]
        async fn test_search_without_input_is_unavailable() {
            let (_, mentoring) = setup();
            let err = mentoring.search_mentors("design").await.unwrap_err();
            assert!(err.is_element_unavailable());
        }
    }

    mod count_tests {
        use super::*;

        #[tokio::test]
        async fn test_no_results_indicator_means_zero() {
            let (driver, mentoring) = setup();
            driver.add_element(Strategy::text("No mentors found"), FakeElement::new());
            driver.add_element(Strategy::css("main article"), FakeElement::new().with_matches(3));
            assert_eq!(mentoring.get_mentor_count().await, 0);
        }

        #[tokio::test]
        async fn test_zero_matches_everywhere() {
            let (_, mentoring) = setup();
            assert_eq!(mentoring.get_mentor_count().await, 0);
        }
    }

    mod filter_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_category_is_unavailable() {
            let (_, mentoring) = setup();
            let err = mentoring.filter_by_category("Nonexistent").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotAvailable);
            assert!(err.to_string().contains("Nonexistent"));
        }

        #[tokio::test]
        async fn test_category_button() {
            let (driver, mentoring) = setup();
            let button = Strategy::css_with_text(
                "[data-testid='category-filter'] button, [data-testid='category-filter'] a, [data-testid='category-filter'] label",
                "Design",
            );
            driver.add_element(button, FakeElement::new());
            driver.add_element(Strategy::test_id("mentor-card"), FakeElement::new().with_matches(2));

            assert_eq!(mentoring.filter_by_category("Design").await.unwrap(), 2);
            assert!(driver.was_called("click:"));
        }

        #[tokio::test]
        async fn test_category_select_fallback() {
            let (driver, mentoring) = setup();
            driver.add_element(
                Strategy::css("select[name='category']"),
                FakeElement::new().with_options(["Design", "Data"]),
            );
            mentoring.filter_by_category("Data").await.unwrap();
            assert!(driver.was_called("select_option:css=select[name='category']:Data"));
        }

        #[tokio::test]
        async fn test_select_without_option_is_unavailable() {
            let (driver, mentoring) = setup();
            driver.add_element(
                Strategy::css("select[name='category']"),
                FakeElement::new().with_options(["Design", "Data"]),
            );
            let err = mentoring.filter_by_category("Nonexistent").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotAvailable);
            assert!(err.to_string().contains("Nonexistent"));
            assert!(driver.was_called("select_option:css=select[name='category']:Nonexistent"));

            let outcome = skip_if_unavailable(Err(err)).unwrap();
            assert!(matches!(outcome, ScenarioOutcome::Skipped { .. }));
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_first_mentor() {
            let (driver, mentoring) = setup();
            driver.add_element(
                Strategy::css(".mentor-card a"),
                FakeElement::new()
                    .with_matches(3)
                    .navigating_to("http://localhost:3000/mentors/ada-lovelace"),
            );
            let url = mentoring.click_first_mentor().await.unwrap();
            assert!(url.ends_with("/mentors/ada-lovelace"));
        }

        #[tokio::test]
        async fn test_error_page_detection() {
            let (driver, mentoring) = setup();
            assert!(!mentoring.shows_error_page().await.unwrap());
            driver.set_title("Page Not Found");
            assert!(mentoring.shows_error_page().await.unwrap());
        }
    }

    mod content_tests {
        use super::*;

        #[tokio::test]
        async fn test_mentor_names_filters_marketing() {
            let (driver, mentoring) = setup();
            driver.add_element(
                Strategy::test_id("mentor-name"),
                FakeElement::new().with_texts([
                    " Ada Lovelace ",
                    "View profile",
                    "Grace Hopper",
                    "Principal engineer with twenty years of experience",
                ]),
            );
            assert_eq!(
                mentoring.mentor_names().await.unwrap(),
                vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()]
            );
        }

        #[tokio::test]
        async fn test_heading_and_search_presence() {
            let (driver, mentoring) = setup();
            assert!(!mentoring.has_search_input().await);
            driver.add_element(Strategy::css("h1"), FakeElement::new().with_text("Find a mentor"));
            driver.add_element(Strategy::placeholder("Search"), FakeElement::new());
            assert_eq!(mentoring.heading_text().await.unwrap(), "Find a mentor");
            assert!(mentoring.has_search_input().await);
        }

        #[tokio::test]
        async fn test_accessibility_probes() {
            let (driver, mentoring) = setup();
            driver.add_element(Strategy::css("main"), FakeElement::new());
            driver.add_element(Strategy::css("img:not([alt])"), FakeElement::new().with_matches(2));
            driver.add_element(
                Strategy::test_id("mentor-search"),
                FakeElement::new().with_attribute("placeholder", "Search mentors"),
            );

            assert!(mentoring.has_main_landmark().await);
            assert_eq!(mentoring.images_missing_alt().await, 2);
            assert_eq!(
                mentoring.search_input_label().await.unwrap().as_deref(),
                Some("Search mentors")
            );
        }
    }
}
