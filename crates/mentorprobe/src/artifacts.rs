//! Run artifacts: screenshots, `results.json` and `report.html`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::result::{ProbeError, Result};

/// Machine-readable results file name
pub const RESULTS_JSON: &str = "results.json";

/// Human-readable report file name
pub const REPORT_HTML: &str = "report.html";

/// Replace characters that are unsafe in file names
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "screenshot".to_string()
    } else {
        cleaned
    }
}

/// `{dir}/{label}-{unix_ms}.png`
#[must_use]
pub fn screenshot_path(dir: &Path, label: &str, unix_ms: i64) -> PathBuf {
    dir.join(format!("{}-{unix_ms}.png", sanitize_label(label)))
}

/// Write PNG bytes to a timestamped file under `dir`
///
/// # Errors
///
/// Returns `Screenshot` if the directory or file cannot be written
pub async fn write_screenshot(dir: &Path, label: &str, png: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ProbeError::Screenshot {
            message: format!("cannot create {}: {e}", dir.display()),
        })?;
    let path = screenshot_path(dir, label, Utc::now().timestamp_millis());
    tokio::fs::write(&path, png)
        .await
        .map_err(|e| ProbeError::Screenshot {
            message: format!("cannot write {}: {e}", path.display()),
        })?;
    tracing::debug!(path = %path.display(), bytes = png.len(), "screenshot written");
    Ok(path)
}

/// Scenario result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Scenario passed
    Passed,
    /// Optional affordance absent
    Skipped,
    /// Scenario failed
    Failed,
}

impl ScenarioStatus {
    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::Passed => "pass",
            Self::Skipped => "skip",
            Self::Failed => "fail",
        }
    }
}

/// One scenario's recorded result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: ScenarioStatus,
    /// Attempts made (1 + retries used)
    pub attempts: u32,
    /// Duration of the final attempt in milliseconds
    pub duration_ms: u64,
    /// Skip reason or failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error kind of a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Failure screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioRecord {
    /// Duration of the final attempt
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Profile the run used
    pub profile: String,
    /// Browser engine
    pub engine: String,
    /// Target origin
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Per-scenario records, in execution order
    pub records: Vec<ScenarioRecord>,
}

impl RunReport {
    /// Create an empty report
    #[must_use]
    pub fn new(
        profile: impl Into<String>,
        engine: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            engine: engine.into(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    fn count(&self, status: ScenarioStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    /// Failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    /// True when nothing failed; skips do not count against a run
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.records.iter().map(ScenarioRecord::duration).sum()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} skipped, {} failed ({} total) in {:.2}s",
            self.passed_count(),
            self.skipped_count(),
            self.failed_count(),
            self.records.len(),
            self.total_duration().as_secs_f64()
        )
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Mentoring E2E Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .scenario { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .scenario.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .scenario.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .scenario.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .message { font-family: monospace; white-space: pre-wrap; }
    </style>
</head>
<body>
"#,
        );

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>Mentoring E2E Report</h1>
    <p>{} against {} ({})</p>
    <h2>{}</h2>
    <p>Started {}</p>
</div>
"#,
            escape_html(&self.engine),
            escape_html(&self.base_url),
            escape_html(&self.profile),
            escape_html(&self.summary()),
            self.started_at.to_rfc3339()
        ));

        for record in &self.records {
            html.push_str(&format!(
                r#"<div class="scenario {}">
    <strong>{}</strong> - {:?} ({}ms, {} attempt(s))
"#,
                record.status.css_class(),
                escape_html(&record.name),
                record.status,
                record.duration_ms,
                record.attempts
            ));
            if let Some(message) = &record.message {
                html.push_str(&format!(
                    "    <div class=\"message\">{}</div>\n",
                    escape_html(message)
                ));
            }
            if let Some(shot) = &record.screenshot {
                html.push_str(&format!(
                    "    <div><a href=\"{0}\">{0}</a></div>\n",
                    escape_html(&shot.display().to_string())
                ));
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Write `results.json` and `report.html` into `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the directory or files cannot be written
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let json_path = dir.join(RESULTS_JSON);
        std::fs::write(&json_path, serde_json::to_string_pretty(self)?)?;
        let html_path = dir.join(REPORT_HTML);
        std::fs::write(&html_path, self.render_html())?;
        Ok((json_path, html_path))
    }
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: ScenarioStatus, message: Option<&str>) -> ScenarioRecord {
        ScenarioRecord {
            name: name.to_string(),
            status,
            attempts: 1,
            duration_ms: 250,
            message: message.map(str::to_string),
            error_kind: None,
            screenshot: None,
        }
    }

    fn sample_report() -> RunReport {
        let mut report = RunReport::new("development", "chromium", "http://localhost:3000");
        report.records = vec![
            record("page_loads", ScenarioStatus::Passed, None),
            record("filter_by_category", ScenarioStatus::Skipped, Some("no category filter")),
            record("open_first_mentor", ScenarioStatus::Failed, Some("<boom> & bust")),
        ];
        report
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_path_contains_label_and_timestamp() {
            let path = screenshot_path(Path::new("shots"), "failure-page_loads", 1_700_000_000_123);
            assert_eq!(
                path,
                PathBuf::from("shots/failure-page_loads-1700000000123.png")
            );
        }

        #[test]
        fn test_label_is_sanitized() {
            assert_eq!(sanitize_label("search: design/ux"), "search--design-ux");
            assert_eq!(sanitize_label(""), "screenshot");
        }

        #[tokio::test]
        async fn test_write_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let before = Utc::now().timestamp_millis();
            let path = write_screenshot(dir.path(), "home", b"png").await.unwrap();

            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("home-"));
            let stamp: i64 = name
                .trim_start_matches("home-")
                .trim_end_matches(".png")
                .parse()
                .unwrap();
            assert!(stamp >= before);
            assert_eq!(std::fs::read(&path).unwrap(), b"png");
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_counts_and_summary() {
            let report = sample_report();
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.skipped_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.total_duration(), Duration::from_millis(750));
            assert!(report.summary().starts_with("1 passed, 1 skipped, 1 failed (3 total)"));
        }

        #[test]
        fn test_skips_do_not_fail_a_run() {
            let mut report = sample_report();
            let _ = report.records.pop();
            assert!(report.all_passed());
        }

        #[test]
        fn test_render_html_escapes() {
            let html = sample_report().render_html();
            assert!(html.contains("<!DOCTYPE html>"));
            assert!(html.contains("scenario skip"));
            assert!(html.contains("&lt;boom&gt; &amp; bust"));
            assert!(!html.contains("<boom>"));
        }

        #[test]
        fn test_write_to_dir() {
            let dir = tempfile::tempdir().unwrap();
            let (json, html) = sample_report().write_to(dir.path()).unwrap();
            assert!(html.exists());

            let parsed: RunReport =
                serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
            assert_eq!(parsed.records.len(), 3);
            assert_eq!(parsed.records[1].status, ScenarioStatus::Skipped);
        }
    }
}
