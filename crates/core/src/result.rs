//! Task outcomes
//!
//! `TaskResult` is what running a task produces; `FixResult` is what a
//! fix attempt produces. A fix that partially fails still returns a
//! `FixResult` carrying its errors, never an `Err`.

use crate::diagnostic::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Final status of one task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// No findings worth reporting
    Passed,
    /// Blocking findings, or the task signalled failure
    Failed,
    /// Findings that do not fail the run
    Warning,
    /// The task did not run (missing tool, blocked by a prior failure)
    Skipped,
}

impl TaskStatus {
    /// Status name for reporting
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Passed => "passed",
            TaskStatus::Failed => "failed",
            TaskStatus::Warning => "warning",
            TaskStatus::Skipped => "skipped",
        }
    }
}

/// How a task reference inside a stage should execute
///
/// The mode is attached to the reference, not the task definition:
/// the same task can run in `Check` mode in one stage and `Fix` mode
/// in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskMode {
    /// Run the check only
    #[default]
    Check,
    /// Fix first (best effort), then re-run the check
    Fix,
    /// Fix only; the result is synthesized from the fix outcome
    FixOnly,
}

impl TaskMode {
    /// Mode name for reporting
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TaskMode::Check => "check",
            TaskMode::Fix => "fix",
            TaskMode::FixOnly => "fix-only",
        }
    }

    /// Whether this mode invokes the task's fix operation
    #[must_use]
    pub fn wants_fix(&self) -> bool {
        matches!(self, TaskMode::Fix | TaskMode::FixOnly)
    }
}

/// How risky a task's fix operation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixSafety {
    /// The fix is mechanical and cannot lose information
    #[default]
    Safe,
    /// The fix may need review (content rewrites)
    Cautious,
}

/// Outcome of running one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Final status
    pub status: TaskStatus,
    /// Findings in discovery order (stable for reporting)
    pub diagnostics: Vec<Diagnostic>,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// How many files the task considered
    pub files_checked: usize,
    /// Whether any finding could be fixed by re-running in fix mode
    pub fixes_available: bool,
    /// Reason the task was skipped; present iff status is `Skipped`
    pub skip_reason: Option<String>,
}

impl TaskResult {
    /// Derive a result from collected diagnostics
    ///
    /// Status derivation: `Failed` iff there is an error-severity
    /// finding and the task is blocking, or `failure_signal` is set
    /// (non-zero tool exit with nothing parsed). Non-blocking errors
    /// and warnings degrade to `Warning`.
    #[must_use]
    pub fn from_diagnostics(
        diagnostics: Vec<Diagnostic>,
        blocking: bool,
        failure_signal: bool,
        duration: Duration,
        files_checked: usize,
    ) -> Self {
        let has_errors = diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);
        let has_warnings = diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning);

        let status = if (has_errors && blocking) || (failure_signal && blocking) {
            TaskStatus::Failed
        } else if has_errors || has_warnings || failure_signal {
            TaskStatus::Warning
        } else {
            TaskStatus::Passed
        };

        let fixes_available = diagnostics.iter().any(|d| d.fixable);

        Self {
            status,
            diagnostics,
            duration,
            files_checked,
            fixes_available,
            skip_reason: None,
        }
    }

    /// A passing result with no findings
    #[must_use]
    pub fn passed(duration: Duration, files_checked: usize) -> Self {
        Self {
            status: TaskStatus::Passed,
            diagnostics: Vec::new(),
            duration,
            files_checked,
            fixes_available: false,
            skip_reason: None,
        }
    }

    /// A skipped result carrying a reason and no diagnostics
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Skipped,
            diagnostics: Vec::new(),
            duration: Duration::ZERO,
            files_checked: 0,
            fixes_available: false,
            skip_reason: Some(reason.into()),
        }
    }

    /// An explicitly failed result with the given findings
    #[must_use]
    pub fn failed(diagnostics: Vec<Diagnostic>, duration: Duration) -> Self {
        Self {
            status: TaskStatus::Failed,
            diagnostics,
            duration,
            files_checked: 0,
            fixes_available: false,
            skip_reason: None,
        }
    }

    /// Count of error-severity findings
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

/// Outcome of one fix attempt
///
/// Partial failure is data, not an error: a fix attempt that could not
/// complete records what went wrong in `errors` and still returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixResult {
    /// Files the fix modified; each path appears once
    pub modified_files: Vec<PathBuf>,
    /// Number of individual fixes applied
    pub fixes_applied: usize,
    /// Non-fatal errors encountered while fixing
    pub errors: Vec<String>,
}

impl FixResult {
    /// An empty fix result (nothing to do)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record a modified file, deduplicating by path
    pub fn record_modified(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.modified_files.contains(&path) {
            self.modified_files.push(path);
        }
    }

    /// True when the fix attempt encountered no errors
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn error_diag() -> Diagnostic {
        Diagnostic::error_at("src/a.rs", 1, 1, "boom")
    }

    fn warning_diag() -> Diagnostic {
        let mut d = Diagnostic::error_at("src/a.rs", 2, 1, "meh");
        d.severity = Severity::Warning;
        d
    }

    #[test]
    fn test_blocking_error_fails() {
        let result = TaskResult::from_diagnostics(
            vec![error_diag()],
            true,
            false,
            Duration::ZERO,
            1,
        );
        assert_eq!(result.status, TaskStatus::Failed);
    }

    #[test]
    fn test_non_blocking_error_warns() {
        let result = TaskResult::from_diagnostics(
            vec![error_diag()],
            false,
            false,
            Duration::ZERO,
            1,
        );
        assert_eq!(result.status, TaskStatus::Warning);
    }

    #[test]
    fn test_warnings_never_fail() {
        let result = TaskResult::from_diagnostics(
            vec![warning_diag()],
            true,
            false,
            Duration::ZERO,
            1,
        );
        assert_eq!(result.status, TaskStatus::Warning);
    }

    #[test]
    fn test_failure_signal_without_diagnostics() {
        let result = TaskResult::from_diagnostics(vec![], true, true, Duration::ZERO, 0);
        assert_eq!(result.status, TaskStatus::Failed);
    }

    #[test]
    fn test_clean_run_passes() {
        let result = TaskResult::from_diagnostics(vec![], true, false, Duration::ZERO, 3);
        assert_eq!(result.status, TaskStatus::Passed);
        assert_eq!(result.files_checked, 3);
    }

    #[test]
    fn test_skipped_carries_reason_and_no_diagnostics() {
        let result = TaskResult::skipped("formatter not installed");
        assert_eq!(result.status, TaskStatus::Skipped);
        assert_eq!(result.skip_reason.as_deref(), Some("formatter not installed"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_fixes_available_tracks_fixable_diagnostics() {
        let result = TaskResult::from_diagnostics(
            vec![error_diag().fixable()],
            false,
            false,
            Duration::ZERO,
            1,
        );
        assert!(result.fixes_available);
    }

    #[test]
    fn test_fix_result_dedups_paths() {
        let mut fix = FixResult::empty();
        fix.record_modified("src/a.rs");
        fix.record_modified("src/a.rs");
        fix.record_modified("src/b.rs");
        assert_eq!(fix.modified_files.len(), 2);
    }

    #[test]
    fn test_fix_result_clean() {
        let mut fix = FixResult::empty();
        assert!(fix.is_clean());
        fix.errors.push("could not rewrite".to_string());
        assert!(!fix.is_clean());
    }

    #[test]
    fn test_task_mode_serde() {
        assert_eq!(
            serde_json::from_value::<TaskMode>(serde_json::json!("fixOnly")).unwrap(),
            TaskMode::FixOnly
        );
        assert_eq!(
            serde_json::from_value::<TaskMode>(serde_json::json!("check")).unwrap(),
            TaskMode::Check
        );
        assert!(TaskMode::Fix.wants_fix());
        assert!(!TaskMode::Check.wants_fix());
    }

    #[test]
    fn test_error_count() {
        let result = TaskResult::from_diagnostics(
            vec![error_diag(), warning_diag(), error_diag()],
            true,
            false,
            Duration::ZERO,
            1,
        );
        assert_eq!(result.error_count(), 2);
    }
}
