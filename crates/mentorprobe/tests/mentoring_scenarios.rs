//! End-to-end scenario tests against scripted mentoring sites.
//!
//! Each test builds a fake site with [`FakeDriver`] on a virtual clock, so
//! probe and readiness timeouts elapse instantly.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use mentorprobe::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const BODY: &str = "Find a mentor who has been there before. Browse engineering, design, \
                    product and data mentors, read their stories and book a free session \
                    whenever it suits you.";

const PROFILE_URL: &str = "http://localhost:3000/mentoring/ada-lovelace";

fn design_filter() -> Strategy {
    let c = "[data-testid='category-filter']";
    Strategy::css_with_text(format!("{c} button, {c} a, {c} label"), "Design")
}

/// A site exposing every optional affordance
fn full_site(clock: Arc<FakeClock>) -> FakeDriver {
    let d = sparse_site(clock);
    d.add_element(
        Strategy::test_id("mentor-search"),
        FakeElement::new().with_attribute("aria-label", "Search mentors"),
    );
    d.add_element(
        Strategy::test_id("mentor-card"),
        FakeElement::new().with_matches(6),
    );
    d.add_element(
        Strategy::test_id("mentor-name"),
        FakeElement::new().with_texts([
            "Ada Lovelace",
            "Grace Hopper",
            "Book a free session today with our experts",
        ]),
    );
    d.add_element(
        Strategy::css("[data-testid='mentor-card'] a"),
        FakeElement::new().navigating_to(PROFILE_URL),
    );
    d.add_element(design_filter(), FakeElement::new().with_text("Design"));
    d
}

/// A site with content and a landmark but no search, cards or filters
fn sparse_site(clock: Arc<FakeClock>) -> FakeDriver {
    let d = FakeDriver::new(clock);
    d.set_title("Find a Mentor");
    d.set_body_text(BODY);
    d.add_element(Strategy::css("main"), FakeElement::new());
    d.add_element(Strategy::css("h1"), FakeElement::new().with_text("  Mentors  "));
    d.set_route(
        "/mentoring/this-route-does-not-exist",
        FakeRoute {
            title: Some("404 Not Found".to_string()),
            body_text: Some("Page not found".to_string()),
        },
    );
    d
}

fn suite_config(dir: &std::path::Path) -> SuiteConfig {
    let mut config = SuiteConfig::default();
    config.artifacts.screenshot_dir = dir.join("screenshots");
    config.artifacts.results_dir = dir.join("results");
    config
}

fn mentoring_on(driver: FakeDriver, config: SuiteConfig) -> (Arc<FakeDriver>, MentoringPage) {
    let clock = driver.clock().clone();
    let driver = Arc::new(driver);
    let config = Arc::new(config);
    let page = Page::new(driver.clone(), clock, &config);
    (driver, MentoringPage::new(page, config))
}

fn run_options() -> RunOptions {
    RunOptions {
        filter: None,
        fail_fast: false,
        scenario_timeout: Duration::from_secs(30),
        retries: 0,
        write_results: true,
    }
}

mod suite {
    use super::*;

    #[tokio::test]
    async fn test_full_site_passes_every_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::shared();
        let launcher = FakeLauncher::new(clock.clone(), full_site);
        let runner = ScenarioRunner::new(
            Arc::new(suite_config(dir.path())),
            Arc::new(launcher),
            clock,
            run_options(),
        );

        let report = runner.run().await.unwrap();
        for record in &report.records {
            assert_eq!(
                record.status,
                ScenarioStatus::Passed,
                "{} did not pass: {:?}",
                record.name,
                record.message
            );
        }
        assert_eq!(report.passed_count(), Scenario::ALL.len());

        let json = std::fs::read_to_string(dir.path().join("results").join(RESULTS_JSON)).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.records.len(), Scenario::ALL.len());
    }

    #[tokio::test]
    async fn test_sparse_site_skips_optional_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::shared();
        let launcher = Arc::new(FakeLauncher::new(clock.clone(), sparse_site));
        let runner = ScenarioRunner::new(
            Arc::new(suite_config(dir.path())),
            launcher.clone(),
            clock,
            run_options(),
        );

        let report = runner.run().await.unwrap();
        let status = |name: &str| {
            report
                .records
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.status)
                .unwrap()
        };

        assert_eq!(status("page_loads"), ScenarioStatus::Passed);
        assert_eq!(status("search_returns_results"), ScenarioStatus::Skipped);
        assert_eq!(status("filter_by_category"), ScenarioStatus::Skipped);
        assert_eq!(status("open_first_mentor"), ScenarioStatus::Skipped);
        assert_eq!(status("accessibility_landmarks"), ScenarioStatus::Skipped);
        assert_eq!(status("unknown_route_handled"), ScenarioStatus::Passed);
        assert!(report.all_passed());
        assert_eq!(launcher.pages_opened(), Scenario::ALL.len());
    }

    #[tokio::test]
    async fn test_overflowing_layout_fails_responsive_only() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::shared();
        let launcher = FakeLauncher::new(clock.clone(), |clock| {
            let d = full_site(clock);
            d.set_content_min_width(1024);
            d
        });
        let mut options = run_options();
        options.filter = mentorprobe::runner::compile_filter(Some("responsive|page_loads")).unwrap();
        let runner = ScenarioRunner::new(
            Arc::new(suite_config(dir.path())),
            Arc::new(launcher),
            clock,
            options,
        );

        let report = runner.run().await.unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.failed_count(), 2);
        let mobile = report
            .records
            .iter()
            .find(|r| r.name == "responsive_mobile")
            .unwrap();
        assert_eq!(mobile.error_kind.as_deref(), Some("assertion"));
        assert!(mobile.message.as_deref().unwrap().contains("1024px wide"));
        assert!(mobile.screenshot.is_some());
    }
}

mod page_object {
    use super::*;

    #[tokio::test]
    async fn test_mentoring_page_loads() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mentoring) = mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let url = mentoring.open().await.unwrap();
        assert!(url.ends_with("/mentoring"));
        let report = mentoring.verify_page_loaded().await.unwrap();
        assert!(report.words >= 20);
        assert_eq!(mentoring.heading_text().await.unwrap(), "Mentors");
    }

    #[tokio::test]
    async fn test_not_found_title_is_title_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let site = full_site(FakeClock::shared());
        site.set_title("404 Not Found");
        let (_, mentoring) = mentoring_on(site, suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        let err = mentoring.verify_page_loaded().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TitleMismatch);
    }

    #[tokio::test]
    async fn test_empty_search_makes_no_driver_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));

        let err = mentoring.search_mentors("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("keyword cannot be empty"));
        assert_eq!(driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_types_submits_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        let count = mentoring.search_mentors("  engineering ").await.unwrap();
        assert_eq!(count, 6);
        let history = driver.history();
        assert!(history.contains(&"fill:test_id=mentor-search:engineering".to_string()));
        assert!(history.contains(&"press:test_id=mentor-search:Enter".to_string()));
    }

    #[tokio::test]
    async fn test_no_results_indicator_means_zero() {
        let dir = tempfile::tempdir().unwrap();
        let site = full_site(FakeClock::shared());
        site.add_element(Strategy::test_id("no-results"), FakeElement::new());
        let (_, mentoring) = mentoring_on(site, suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        assert_eq!(mentoring.get_mentor_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_cards_and_no_indicator_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mentoring) =
            mentoring_on(sparse_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        assert_eq!(mentoring.get_mentor_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_category_is_unavailable_then_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = suite_config(dir.path());
        config.fixtures.category = "Nonexistent".to_string();
        let (_, mentoring) = mentoring_on(full_site(FakeClock::shared()), config);
        let _ = mentoring.open().await.unwrap();

        let err = mentoring.filter_by_category("Nonexistent").await.unwrap_err();
        assert!(err.is_element_unavailable());
        assert!(err.to_string().contains("Nonexistent"));

        let outcome = Scenario::FilterByCategory.run(&mentoring).await;
        assert!(matches!(outcome, ScenarioOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_select_lacking_category_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = suite_config(dir.path());
        config.fixtures.category = "Nonexistent".to_string();
        let site = sparse_site(FakeClock::shared());
        site.add_element(
            Strategy::css("select[name='category']"),
            FakeElement::new().with_options(["Design", "Data"]),
        );
        let (driver, mentoring) = mentoring_on(site, config);
        let _ = mentoring.open().await.unwrap();

        let err = mentoring.filter_by_category("Nonexistent").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotAvailable);
        assert!(driver.was_called("select_option:"));

        let outcome = Scenario::FilterByCategory.run(&mentoring).await;
        assert!(matches!(outcome, ScenarioOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_known_category_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        assert_eq!(mentoring.filter_by_category("Design").await.unwrap(), 6);
        assert!(driver.was_called(&format!("click:{}", design_filter())));
    }

    #[tokio::test]
    async fn test_mentor_names_drop_marketing_copy() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        let names = mentoring.mentor_names().await.unwrap();
        assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);
    }

    #[tokio::test]
    async fn test_first_mentor_opens_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();

        assert_eq!(mentoring.click_first_mentor().await.unwrap(), PROFILE_URL);
    }
}

mod facade_properties {
    use super::*;

    #[tokio::test]
    async fn test_type_text_read_back_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let site = full_site(FakeClock::shared());
        site.add_element(
            Strategy::test_id("mentor-search"),
            FakeElement::new().with_max_length(4),
        );
        let (_, mentoring) = mentoring_on(site, suite_config(dir.path()));
        let input = mentoring.config().selectors.search_input.clone();

        let err = mentoring
            .page()
            .type_text(&input, "engineering")
            .await
            .unwrap_err();
        match err {
            ProbeError::VerificationMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "engineering");
                assert_eq!(actual, "engi");
            }
            other => panic!("unexpected error: {other}"),
        }

        mentoring.page().type_text(&input, "data").await.unwrap();
    }

    #[tokio::test]
    async fn test_screenshot_path_has_label_and_fresh_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let before = chrono::Utc::now().timestamp_millis();

        let path = mentoring.page().screenshot("search results").await.unwrap();
        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        let (label, ts) = name.rsplit_once('-').unwrap();
        assert_eq!(label, "search-results");
        assert!(ts.parse::<i64>().unwrap() >= before);
        assert!(path.starts_with(dir.path().join("screenshots")));
        assert_eq!(std::fs::read(&path).unwrap(), FAKE_PNG);
    }

    #[tokio::test]
    async fn test_readiness_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, mentoring) =
            mentoring_on(full_site(FakeClock::shared()), suite_config(dir.path()));
        let _ = mentoring.open().await.unwrap();
        let options = ReadinessOptions::from_config(mentoring.config());

        let first = mentoring.page().await_ready(&options).await.unwrap();
        driver.clear_history();
        let second = mentoring.page().await_ready(&options).await.unwrap();
        assert_eq!(first.signals, second.signals);
        assert!(driver.was_called("body_text"));
        assert!(driver.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_stabilisation_bounded_by_two_settle_delays() {
        let clock = FakeClock::shared();
        let site = full_site(clock.clone());
        site.add_element(
            Strategy::test_id("mentor-card"),
            FakeElement::new().with_count_samples([1, 2, 3, 4, 5, 6]),
        );
        let config = SuiteConfig::default();
        let cards = config.selectors.mentor_cards.clone();
        let (_, mentoring) = mentoring_on(site, config);
        let _ = mentoring.open().await.unwrap();
        let options = ReadinessOptions::from_config(mentoring.config())
            .with_min_content_words(0)
            .with_count_target(cards);

        clock.reset_slept();
        let report = mentoring.page().await_ready(&options).await.unwrap();
        let settle = Duration::from_millis(options.settle_delay_ms);
        assert!(clock.total_slept() <= settle * 2);
        assert!(report.sample.unwrap().delays() <= 2);
    }
}
