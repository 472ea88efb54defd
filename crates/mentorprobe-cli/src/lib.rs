//! Mentorprobe CLI library
//!
//! Command-line front end for the mentoring scenario suite.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, RunArgs, SuiteArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{record_line, ProgressReporter};
pub use runner::{apply_output_dir, list_scenarios, load_suite_config, select_engine, SuiteRunner};
