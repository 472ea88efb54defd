//! Mentorprobe CLI: run the mentoring end-to-end scenarios
//!
//! ## Usage
//!
//! ```bash
//! mentorprobe run                         # Run every scenario
//! mentorprobe run --filter '^search'      # Filter scenarios
//! mentorprobe run --env staging --headed  # Another profile, visible browser
//! mentorprobe list                        # List scenarios
//! mentorprobe config --env production     # Show resolved configuration
//! ```

use clap::Parser;
use mentorprobe_cli::{
    list_scenarios, load_suite_config, Cli, CliConfig, CliError, CliResult, ColorChoice,
    Commands, ConfigArgs, ListArgs, SuiteRunner, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config);

    match cli.command {
        Commands::Run(args) => {
            let Some(report) = SuiteRunner::new(config).run(&args)? else {
                return Ok(());
            };
            if report.all_passed() {
                Ok(())
            } else {
                Err(CliError::ScenariosFailed {
                    failed: report.failed_count(),
                    total: report.records.len(),
                })
            }
        }
        Commands::List(args) => run_list(&args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
}

fn init_tracing(config: CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color())
        .with_target(false)
        .try_init();
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    for scenario in list_scenarios(args.filter.as_deref())? {
        println!("{:<26} {}", scenario.name(), scenario.description());
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = load_suite_config(&args.suite)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
