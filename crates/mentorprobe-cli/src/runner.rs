//! Suite execution for the `run`, `list` and `config` commands

use mentorprobe::runner::{compile_filter, select_scenarios};
use mentorprobe::{
    BrowserEngine, PageLauncher, RunOptions, RunReport, Scenario, ScenarioRunner, SuiteConfig,
    SystemClock,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::commands::{RunArgs, SuiteArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Resolve suite configuration from the profile and overlay flags
///
/// # Errors
///
/// Returns error if the profile is unknown or the overlay is invalid
pub fn load_suite_config(args: &SuiteArgs) -> CliResult<SuiteConfig> {
    Ok(SuiteConfig::load(
        args.profile.as_deref(),
        args.config.as_deref(),
    )?)
}

/// Redirect results to `dir`, screenshots to `dir/screenshots`
pub fn apply_output_dir(config: &mut SuiteConfig, dir: &Path) {
    config.artifacts.results_dir = dir.to_path_buf();
    config.artifacts.screenshot_dir = dir.join("screenshots");
}

/// Pick the engine to drive; only chromium is supported
///
/// # Errors
///
/// Returns a config error for unknown or unsupported engines
pub fn select_engine(config: &SuiteConfig, requested: Option<&str>) -> CliResult<BrowserEngine> {
    let engine = match requested {
        Some(name) => name.parse::<BrowserEngine>()?,
        None => config
            .browsers
            .first()
            .copied()
            .ok_or_else(|| CliError::config("no browser engine configured"))?,
    };
    if engine != BrowserEngine::Chromium {
        return Err(CliError::config(format!(
            "engine {} is not supported; only chromium can be driven",
            engine.as_str()
        )));
    }
    Ok(engine)
}

/// Scenarios selected by `filter`
///
/// # Errors
///
/// Returns error for an invalid regex
pub fn list_scenarios(filter: Option<&str>) -> CliResult<Vec<Scenario>> {
    let filter = compile_filter(filter)?;
    Ok(select_scenarios(filter.as_ref()))
}

/// Runs the scenario suite from parsed arguments
#[derive(Debug)]
pub struct SuiteRunner {
    cli: CliConfig,
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(cli: CliConfig) -> Self {
        Self { cli }
    }

    /// Run the suite; `Ok(None)` when the filter selects nothing
    ///
    /// # Errors
    ///
    /// Returns configuration, launch and result-writing errors
    pub fn run(&self, args: &RunArgs) -> CliResult<Option<RunReport>> {
        let mut config = load_suite_config(&args.suite)?;
        if let Some(ref dir) = args.output {
            apply_output_dir(&mut config, dir);
        }
        let engine = select_engine(&config, args.browser.as_deref())?;

        let filter = compile_filter(args.filter.as_deref())?;
        let scenarios = select_scenarios(filter.as_ref());
        let mut reporter =
            ProgressReporter::new(self.cli.color.should_color(), self.cli.verbosity.is_quiet());
        if scenarios.is_empty() {
            reporter.warning("No scenarios match the filter");
            return Ok(None);
        }

        let options = RunOptions {
            filter,
            fail_fast: args.fail_fast,
            scenario_timeout: Duration::from_millis(args.timeout),
            retries: args.retries.unwrap_or_else(|| config.effective_retries()),
            write_results: true,
        };

        reporter.header(&format!(
            "Mentoring scenarios ({}, {})",
            config.profile, config.base_url
        ));
        reporter.start_progress(scenarios.len() as u64, "starting");
        let reporter = Arc::new(reporter);
        let config = Arc::new(config);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(async {
            let launcher = launch(engine, &config, args.headed).await?;
            let runner = ScenarioRunner::new(
                Arc::clone(&config),
                launcher,
                Arc::new(SystemClock::new()),
                options,
            )
            .with_observer(Box::new(Arc::clone(&reporter)));
            Ok::<_, CliError>(runner.run().await?)
        })?;

        reporter.finish();
        reporter.summary(
            report.passed_count(),
            report.failed_count(),
            report.skipped_count(),
            report.total_duration(),
        );
        reporter.info(&format!(
            "results written to {}",
            config.artifacts.results_dir.display()
        ));
        info!(summary = %report.summary(), "suite finished");
        Ok(Some(report))
    }
}

#[cfg(feature = "browser")]
async fn launch(
    engine: BrowserEngine,
    config: &SuiteConfig,
    headed: bool,
) -> CliResult<Arc<dyn PageLauncher>> {
    use mentorprobe::{ChromiumLauncher, LaunchOptions};

    let options = LaunchOptions::from_config(config).with_headless(!headed);
    let launcher: Arc<dyn PageLauncher> = Arc::new(ChromiumLauncher::launch(engine, options).await?);
    Ok(launcher)
}

#[cfg(not(feature = "browser"))]
async fn launch(
    _engine: BrowserEngine,
    _config: &SuiteConfig,
    _headed: bool,
) -> CliResult<Arc<dyn PageLauncher>> {
    Err(CliError::config(
        "built without browser support; rebuild with --features browser",
    ))
}
