//! Stage data model
//!
//! A stage is a named set of task references, each tagged with an
//! execution mode, plus the scheduling attributes the runner needs:
//! parallelism, dependencies on other stages, and whether a failure
//! should stop the run.

use gantry_config::StageSpec;
use gantry_core::{FixResult, TaskMode, TaskResult, TaskStatus};
use std::collections::BTreeSet;

/// One schedulable stage
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage name, unique within a run
    pub name: String,
    /// Ordered `(task id, mode)` pairs
    pub tasks: Vec<(String, TaskMode)>,
    /// Run the stage's tasks concurrently
    pub parallel: bool,
    /// Stages that must complete before this one starts
    pub dependencies: BTreeSet<String>,
    /// Keep the run going even if this stage fails
    pub continue_on_error: bool,
}

impl Stage {
    /// Create an empty sequential stage
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
            parallel: false,
            dependencies: BTreeSet::new(),
            continue_on_error: false,
        }
    }

    /// Append a task reference
    #[must_use]
    pub fn task(mut self, id: impl Into<String>, mode: TaskMode) -> Self {
        self.tasks.push((id.into(), mode));
        self
    }

    /// Set the parallel flag
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add a dependency on another stage
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Set the continue-on-error flag
    #[must_use]
    pub fn continue_on_error(mut self, flag: bool) -> Self {
        self.continue_on_error = flag;
        self
    }

    /// Build from a normalized configuration spec
    #[must_use]
    pub fn from_spec(spec: StageSpec) -> Self {
        Self {
            name: spec.name,
            tasks: spec
                .tasks
                .iter()
                .map(|r| (r.id().to_string(), r.mode()))
                .collect(),
            parallel: spec.parallel,
            dependencies: spec.dependencies,
            continue_on_error: spec.continue_on_error,
        }
    }
}

/// Outcome of one task reference inside a stage
#[derive(Debug, Clone)]
pub struct TaskRunResult {
    /// Task identifier as referenced by the stage
    pub task_id: String,
    /// Human-readable task name
    pub task_name: String,
    /// Mode the reference ran in
    pub mode: TaskMode,
    /// Whether the task was blocking
    pub blocking: bool,
    /// The check (or synthesized fix-only) result
    pub result: TaskResult,
    /// The fix outcome, when the mode invoked a fix
    pub fix: Option<FixResult>,
}

impl TaskRunResult {
    /// True when this entry fails its stage
    #[must_use]
    pub fn fails_stage(&self) -> bool {
        self.result.status == TaskStatus::Failed && self.blocking
    }
}

/// Outcome of one executed stage
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Stage name
    pub name: String,
    /// Per-task outcomes in declaration order
    pub task_results: Vec<TaskRunResult>,
    /// Derived success: false if any blocking task failed
    pub success: bool,
    /// Copied from the stage for the runner's continue decision
    pub continue_on_error: bool,
}

impl StageResult {
    /// Derive a stage result from its task outcomes
    #[must_use]
    pub fn derive(
        name: impl Into<String>,
        task_results: Vec<TaskRunResult>,
        continue_on_error: bool,
    ) -> Self {
        let success = !task_results.iter().any(TaskRunResult::fails_stage);
        Self {
            name: name.into(),
            task_results,
            success,
            continue_on_error,
        }
    }

    /// Total findings across the stage's tasks
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.task_results
            .iter()
            .map(|r| r.result.diagnostics.len())
            .sum()
    }
}

/// A stage that never ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedStage {
    /// Stage name
    pub name: String,
    /// Why it never started
    pub reason: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::time::Duration;

    fn entry(id: &str, status: TaskStatus, blocking: bool) -> TaskRunResult {
        let result = match status {
            TaskStatus::Failed => TaskResult::failed(vec![], Duration::ZERO),
            TaskStatus::Skipped => TaskResult::skipped("because"),
            _ => TaskResult::passed(Duration::ZERO, 0),
        };
        TaskRunResult {
            task_id: id.to_string(),
            task_name: id.to_string(),
            mode: TaskMode::Check,
            blocking,
            result,
            fix: None,
        }
    }

    #[test]
    fn test_builder() {
        let stage = Stage::new("quality")
            .task("format", TaskMode::Check)
            .task("unused", TaskMode::Check)
            .parallel(true)
            .depends_on("fix")
            .continue_on_error(true);

        assert_eq!(stage.name, "quality");
        assert_eq!(stage.tasks.len(), 2);
        assert!(stage.parallel);
        assert!(stage.dependencies.contains("fix"));
        assert!(stage.continue_on_error);
    }

    #[test]
    fn test_success_derivation_blocking_failure() {
        let result = StageResult::derive(
            "s",
            vec![
                entry("a", TaskStatus::Passed, true),
                entry("b", TaskStatus::Failed, true),
            ],
            false,
        );
        assert!(!result.success);
    }

    #[test]
    fn test_success_derivation_non_blocking_failure() {
        let result = StageResult::derive(
            "s",
            vec![entry("a", TaskStatus::Failed, false)],
            false,
        );
        assert!(result.success);
    }

    #[test]
    fn test_success_derivation_skips_do_not_fail() {
        let result = StageResult::derive(
            "s",
            vec![entry("a", TaskStatus::Skipped, true)],
            false,
        );
        assert!(result.success);
    }

    #[test]
    fn test_from_spec() {
        let spec: StageSpec = serde_json::from_value(serde_json::json!({
            "name": "verify",
            "tasks": ["build", {"id": "format", "mode": "fix"}],
            "parallel": true,
            "dependencies": ["prep"]
        }))
        .unwrap();

        let stage = Stage::from_spec(spec.normalize().unwrap());
        assert_eq!(stage.name, "verify");
        assert_eq!(stage.tasks[0], ("build".to_string(), TaskMode::Check));
        assert_eq!(stage.tasks[1], ("format".to_string(), TaskMode::Fix));
        assert!(stage.parallel);
        assert!(stage.dependencies.contains("prep"));
    }
}
