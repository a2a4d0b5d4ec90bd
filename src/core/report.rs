//! Build results and run aggregation
//!
//! Results arrive in completion order under parallel scheduling, so the
//! run keys them by package name and reports them in plan order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::error::{EXIT_BUILD_FAILED, EXIT_SUCCESS};

/// Outcome of one package build attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// Builder exited successfully
    Success,
    /// Builder failed, timed out, or could not run
    Failed,
    /// Not built (blocked by a dependency or cancelled)
    Skipped,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of one package build attempt
///
/// Created once per attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
    /// Package name
    pub package_name: String,
    /// Outcome
    pub status: BuildStatus,
    /// Wall-clock duration of the attempt
    pub duration_seconds: f64,
    /// Failure or skip reason (builder output for failures)
    pub error_detail: Option<String>,
    /// Captured builder log
    pub log_path: Option<PathBuf>,
}

impl BuildResult {
    /// A successful build
    pub fn success(package_name: &str, duration_seconds: f64, log_path: Option<PathBuf>) -> Self {
        Self {
            package_name: package_name.to_string(),
            status: BuildStatus::Success,
            duration_seconds,
            error_detail: None,
            log_path,
        }
    }

    /// A failed build
    pub fn failed(
        package_name: &str,
        duration_seconds: f64,
        detail: impl Into<String>,
        log_path: Option<PathBuf>,
    ) -> Self {
        Self {
            package_name: package_name.to_string(),
            status: BuildStatus::Failed,
            duration_seconds,
            error_detail: Some(detail.into()),
            log_path,
        }
    }

    /// A package that was not built
    pub fn skipped(package_name: &str, reason: impl Into<String>) -> Self {
        Self {
            package_name: package_name.to_string(),
            status: BuildStatus::Skipped,
            duration_seconds: 0.0,
            error_detail: Some(reason.into()),
            log_path: None,
        }
    }

    /// First line of the error detail, for one-line reports
    pub fn summary_line(&self) -> Option<&str> {
        self.error_detail
            .as_deref()
            .and_then(|d| d.lines().find(|l| !l.trim().is_empty()))
    }
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Successful builds
    pub succeeded: usize,
    /// Failed builds
    pub failed: usize,
    /// Skipped packages
    pub skipped: usize,
    /// All results
    pub total: usize,
}

/// All results of one orchestrator run
#[derive(Debug, Clone)]
pub struct BuildRun {
    /// Plan order, for reporting
    order: Vec<String>,
    results: HashMap<String, BuildResult>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    cancelled: bool,
}

impl BuildRun {
    /// Start a run over packages in plan order
    pub fn start(order: Vec<String>) -> Self {
        Self {
            order,
            results: HashMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
        }
    }

    /// Record a result
    ///
    /// A package is only recorded once; later results for the same package
    /// are ignored.
    pub fn record(&mut self, result: BuildResult) {
        if self.results.contains_key(&result.package_name) {
            tracing::warn!(
                "Ignoring duplicate result for package '{}'",
                result.package_name
            );
            return;
        }
        self.results.insert(result.package_name.clone(), result);
    }

    /// Mark the run as finished
    pub fn finish(&mut self, cancelled: bool) {
        self.finished_at = Some(Utc::now());
        self.cancelled = cancelled;
    }

    /// Result for a package
    pub fn get(&self, name: &str) -> Option<&BuildResult> {
        self.results.get(name)
    }

    /// Whether a package has a result yet
    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    /// Results in plan order
    pub fn results(&self) -> Vec<&BuildResult> {
        self.order
            .iter()
            .filter_map(|name| self.results.get(name))
            .collect()
    }

    /// Number of recorded results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no results were recorded
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Run start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run finish time
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        #[allow(clippy::cast_precision_loss)]
        let millis = (end - self.started_at).num_milliseconds() as f64;
        millis / 1000.0
    }

    /// Count results per status
    pub fn summary(&self) -> BuildSummary {
        let mut summary = BuildSummary {
            total: self.results.len(),
            ..BuildSummary::default()
        };
        for result in self.results.values() {
            match result.status {
                BuildStatus::Success => summary.succeeded += 1,
                BuildStatus::Failed => summary.failed += 1,
                BuildStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// A run is successful iff every result is a success
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self
                .results
                .values()
                .all(|r| r.status == BuildStatus::Success)
    }

    /// Process exit code: 0 if every build succeeded, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_BUILD_FAILED
        }
    }

    /// Human-readable report: one line per package, then a summary line
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for result in self.results() {
            let symbol = match result.status {
                BuildStatus::Success => status::SUCCESS,
                BuildStatus::Failed => status::ERROR,
                BuildStatus::Skipped => status::SKIPPED,
            };
            let _ = write!(
                out,
                "{symbol} {:<24} {:<8} {:>7.1}s",
                result.package_name, result.status, result.duration_seconds
            );
            if let Some(line) = result.summary_line() {
                let _ = write!(out, "  {line}");
            }
            out.push('\n');
        }

        let summary = self.summary();
        let _ = write!(
            out,
            "\n{} succeeded, {} failed, {} skipped ({} total) in {:.1}s",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.total,
            self.duration_seconds()
        );
        if self.cancelled {
            out.push_str(" [cancelled]");
        }
        out.push('\n');
        out
    }

    /// Machine-readable report
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": if self.is_success() { "success" } else { "error" },
            "cancelled": self.cancelled,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.map(|t| t.to_rfc3339()),
            "duration_seconds": self.duration_seconds(),
            "summary": self.summary(),
            "results": self.results(),
        })
    }
}

/// Status symbols used in reports
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Skipped prefix
    pub const SKIPPED: &str = "-";
}
