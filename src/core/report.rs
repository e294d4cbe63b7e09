//! Build result aggregation and reporting
//!
//! Collects one [`BuildResult`] per module into a [`RunSummary`] and renders
//! it as a human-readable table or machine-readable JSON. The summary's exit
//! code is the authoritative pass/fail signal: non-zero iff any module
//! failed to deliver output, skipped modules included.

use serde::Serialize;

use crate::config::defaults;

/// Terminal outcome of one module build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Subprocess exited zero
    Succeeded,
    /// Subprocess exited non-zero
    Failed,
    /// Subprocess exceeded the wall-clock bound and was killed
    TimedOut,
    /// Subprocess could not be launched
    LaunchError,
    /// Never launched: an earlier level failed
    Skipped,
}

impl BuildOutcome {
    /// Human label used in the summary table
    pub fn label(self) -> &'static str {
        match self {
            Self::Succeeded => "ok",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::LaunchError => "launch error",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-module outcome. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Module name
    pub module_name: String,
    /// Terminal outcome
    pub outcome: BuildOutcome,
    /// Subprocess exit status, or a sentinel for synthetic outcomes
    pub exit_code: i32,
    /// Wall-clock seconds from launch to exit. For batched levels this is
    /// the level duration apportioned evenly, an approximation rather than
    /// a measured per-module time.
    pub duration_seconds: f64,
    /// Failure detail, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl BuildResult {
    /// Successful delivery of build output
    pub fn success(&self) -> bool {
        self.outcome == BuildOutcome::Succeeded
    }

    /// Synthetic result for a module skipped after an upstream failure
    pub fn skipped(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            outcome: BuildOutcome::Skipped,
            exit_code: defaults::EXIT_CODE_SKIPPED,
            duration_seconds: 0.0,
            error_detail: Some("skipped due to upstream failure".to_string()),
        }
    }
}

/// Aggregate over all BuildResults of one invocation
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Per-module results in completion order per level
    pub results: Vec<BuildResult>,
    /// Total wall-clock duration of the run in seconds
    pub total_duration_seconds: f64,
}

impl RunSummary {
    /// Create an empty summary; the executor appends as levels complete
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result
    pub fn push(&mut self, result: BuildResult) {
        self.results.push(result);
    }

    /// Freeze the summary with the run's total duration
    pub fn finalize(&mut self, total_duration_seconds: f64) {
        self.total_duration_seconds = total_duration_seconds;
    }

    /// Count of successful modules
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    /// Count of failed modules (build failures, timeouts, launch errors)
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    BuildOutcome::Failed | BuildOutcome::TimedOut | BuildOutcome::LaunchError
                )
            })
            .count()
    }

    /// Count of skipped modules
    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == BuildOutcome::Skipped)
            .count()
    }

    /// Process exit code: non-zero iff any module did not deliver output
    pub fn exit_code(&self) -> i32 {
        i32::from(self.results.iter().any(|r| !r.success()))
    }

    /// Render the human-readable summary table
    pub fn render_human(&self) -> String {
        let name_width = self
            .results
            .iter()
            .map(|r| r.module_name.len())
            .max()
            .unwrap_or(6)
            .max(6);

        let mut out = String::new();
        out.push_str(&format!(
            "{:<name_width$}  {:<12}  {:>9}  {:>5}\n",
            "MODULE", "RESULT", "TIME", "EXIT"
        ));
        for result in &self.results {
            out.push_str(&format!(
                "{:<name_width$}  {:<12}  {:>8.1}s  {:>5}\n",
                result.module_name,
                result.outcome.label(),
                result.duration_seconds,
                result.exit_code,
            ));
        }
        out.push_str(&format!(
            "\n{} succeeded, {} failed, {} skipped in {:.1}s\n",
            self.succeeded(),
            self.failed(),
            self.skipped(),
            self.total_duration_seconds,
        ));
        out
    }

    /// Render the machine-readable summary
    pub fn render_json(&self) -> serde_json::Result<String> {
        let value = serde_json::json!({
            "succeeded": self.succeeded(),
            "failed": self.failed(),
            "skipped": self.skipped(),
            "total_duration_seconds": self.total_duration_seconds,
            "exit_code": self.exit_code(),
            "results": self.results,
        });
        serde_json::to_string_pretty(&value)
    }
}
