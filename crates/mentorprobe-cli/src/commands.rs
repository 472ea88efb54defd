//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ColorChoice;

/// Mentorprobe: end-to-end scenarios for the mentoring pages
#[derive(Parser, Debug)]
#[command(name = "mentorprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mentoring scenarios against a browser
    Run(RunArgs),

    /// List scenarios
    List(ListArgs),

    /// Print the resolved configuration as JSON
    Config(ConfigArgs),
}

/// Profile and overlay selection
#[derive(Args, Debug, Clone, Default)]
pub struct SuiteArgs {
    /// Profile (development, staging, production); defaults to $TEST_ENV
    #[arg(long = "env", value_name = "PROFILE")]
    pub profile: Option<String>,

    /// YAML file overlaid on the profile
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Profile and overlay
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Only run scenarios whose name matches this regex
    #[arg(short, long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Browser engine; defaults to the profile's first
    #[arg(short, long, value_name = "ENGINE")]
    pub browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Per-scenario timeout in milliseconds
    #[arg(long, default_value = "120000", value_name = "MS")]
    pub timeout: u64,

    /// Retries after a failed attempt; defaults to the profile's policy
    #[arg(long)]
    pub retries: Option<u32>,

    /// Output directory for results and screenshots
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose name matches this regex
    #[arg(short, long, value_name = "REGEX")]
    pub filter: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Profile and overlay
    #[command(flatten)]
    pub suite: SuiteArgs,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
