//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use mentorprobe::{RunObserver, Scenario, ScenarioRecord, ScenarioStatus};
use std::time::Duration;

/// Progress reporter for a scenario run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(line),
            None => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.prefixed("✓", "PASS", |s| style(s).green().bold().to_string(), message);
        }
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        if !self.quiet {
            self.prefixed("○", "SKIP", |s| style(s).yellow().to_string(), message);
        }
    }

    /// Print a failure message; shown even in quiet mode
    pub fn failure(&self, message: &str) {
        self.prefixed("✗", "FAIL", |s| style(s).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.prefixed("⚠", "WARN", |s| style(s).yellow().bold().to_string(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.prefixed("ℹ", "INFO", |s| style(s).blue().bold().to_string(), message);
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        self.line("");
        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            self.line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

/// One-line description of a finished scenario
#[must_use]
pub fn record_line(record: &ScenarioRecord) -> String {
    let mut line = format!("{} ({}ms", record.name, record.duration_ms);
    if record.attempts > 1 {
        line.push_str(&format!(", {} attempts", record.attempts));
    }
    line.push(')');
    if let Some(ref message) = record.message {
        line.push_str(&format!(": {message}"));
    }
    line
}

impl RunObserver for ProgressReporter {
    fn scenario_started(&self, scenario: Scenario) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(scenario.name());
        }
    }

    fn scenario_finished(&self, record: &ScenarioRecord) {
        let line = record_line(record);
        match record.status {
            ScenarioStatus::Passed => self.success(&line),
            ScenarioStatus::Skipped => self.skipped(&line),
            ScenarioStatus::Failed => self.failure(&line),
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }
}
