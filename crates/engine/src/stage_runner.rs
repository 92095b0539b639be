//! Stage scheduler
//!
//! Executes a validated stage DAG in waves: every iteration computes
//! the set of ready stages (all dependencies completed and satisfied),
//! runs them concurrently, and waits for the whole wave before
//! computing the next one. A failed stage without `continue_on_error`
//! stops the run at that barrier; nothing is ever cancelled mid-task.
//!
//! Reporting is deterministic under concurrency: stages are recorded
//! in the order the wave declared them and task results in the order
//! the stage declared its tasks, never in completion order.

use crate::graph;
use crate::stage::{BlockedStage, Stage, StageResult, TaskRunResult};
use crate::task::TaskRegistry;
use gantry_core::{Diagnostic, HookContext, Result, Severity, TaskMode, TaskResult};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

/// Everything a finished (or aborted) run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Results for stages that executed, in completion-wave order
    pub stages: Vec<StageResult>,
    /// Stages that never started, with the reason
    pub blocked: Vec<BlockedStage>,
}

impl RunOutcome {
    /// True when every executed stage either succeeded or declared
    /// `continue_on_error`, and nothing was blocked
    #[must_use]
    pub fn success(&self) -> bool {
        self.blocked.is_empty()
            && self
                .stages
                .iter()
                .all(|s| s.success || s.continue_on_error)
    }
}

/// Executes stage DAGs against a task registry and context
pub struct StageRunner<'a> {
    registry: &'a TaskRegistry,
    ctx: &'a HookContext,
}

impl<'a> StageRunner<'a> {
    /// Create a runner borrowing the registry and context
    #[must_use]
    pub fn new(registry: &'a TaskRegistry, ctx: &'a HookContext) -> Self {
        Self { registry, ctx }
    }

    /// Run all stages to completion or first blocking failure
    ///
    /// # Errors
    ///
    /// Returns a configuration error before executing anything when
    /// the dependency graph has a cycle, a duplicate name, or an
    /// unknown dependency.
    #[tracing::instrument(skip_all, fields(stage_count = stages.len()))]
    pub fn run(&self, stages: &[Stage]) -> Result<RunOutcome> {
        graph::validate(stages)?;

        let mut pending: IndexMap<&str, &Stage> =
            stages.iter().map(|s| (s.name.as_str(), s)).collect();
        // name -> (succeeded, continue_on_error)
        let mut completed: HashMap<String, (bool, bool)> = HashMap::new();
        let mut results: Vec<StageResult> = Vec::with_capacity(stages.len());
        let mut blocked: Vec<BlockedStage> = Vec::new();

        while !pending.is_empty() {
            let ready: Vec<&Stage> = pending
                .values()
                .filter(|stage| {
                    stage.dependencies.iter().all(|dep| {
                        completed
                            .get(dep)
                            .is_some_and(|(ok, keep_going)| *ok || *keep_going)
                    })
                })
                .copied()
                .collect();

            if ready.is_empty() {
                // Unsatisfiable: a prerequisite failed without
                // continue_on_error (or the guard in the barrier check
                // below already fired). Report what can never run.
                for stage in pending.values() {
                    blocked.push(BlockedStage {
                        name: stage.name.clone(),
                        reason: format!(
                            "unsatisfied dependencies: {}",
                            stage
                                .dependencies
                                .iter()
                                .map(String::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    });
                }
                break;
            }

            tracing::debug!(
                wave = ?ready.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
                "Executing ready stages"
            );

            // The wave barrier: par_iter joins every stage before
            // collect returns, and collect preserves declaration
            // order regardless of completion order.
            let wave: Vec<StageResult> = ready
                .par_iter()
                .map(|stage| self.execute_stage(stage))
                .collect();

            let mut failed_stage: Option<String> = None;
            for result in wave {
                pending.shift_remove(result.name.as_str());
                completed.insert(
                    result.name.clone(),
                    (result.success, result.continue_on_error),
                );
                if !result.success && !result.continue_on_error && failed_stage.is_none() {
                    failed_stage = Some(result.name.clone());
                }
                results.push(result);
            }

            if let Some(failed) = failed_stage {
                tracing::debug!(stage = %failed, "Aborting run at barrier after stage failure");
                for stage in pending.values() {
                    let reason = if graph::depends_transitively(stage, &failed, stages) {
                        format!("blocked by {failed}")
                    } else {
                        format!("run aborted after stage '{failed}' failed")
                    };
                    blocked.push(BlockedStage {
                        name: stage.name.clone(),
                        reason,
                    });
                }
                break;
            }
        }

        Ok(RunOutcome {
            stages: results,
            blocked,
        })
    }

    /// Execute one stage, honoring its parallel flag
    #[tracing::instrument(skip(self, stage), fields(stage = %stage.name, parallel = stage.parallel))]
    fn execute_stage(&self, stage: &Stage) -> StageResult {
        let task_results: Vec<TaskRunResult> = if stage.parallel {
            // All siblings run to completion; no early cancellation.
            stage
                .tasks
                .par_iter()
                .map(|(id, mode)| self.run_entry(id, *mode))
                .collect()
        } else {
            let mut out = Vec::with_capacity(stage.tasks.len());
            let mut short_circuited = false;
            for (id, mode) in &stage.tasks {
                if short_circuited {
                    out.push(self.skipped_entry(id, *mode, "blocked by prior task failure"));
                    continue;
                }
                let entry = self.run_entry(id, *mode);
                if entry.fails_stage() && !stage.continue_on_error {
                    short_circuited = true;
                }
                out.push(entry);
            }
            out
        };

        StageResult::derive(stage.name.clone(), task_results, stage.continue_on_error)
    }

    /// Execute one `(task, mode)` reference
    fn run_entry(&self, id: &str, mode: TaskMode) -> TaskRunResult {
        let Some(task) = self.registry.resolve(id) else {
            // A misconfigured stage must fail loudly, not silently
            // omit a check.
            return TaskRunResult {
                task_id: id.to_string(),
                task_name: id.to_string(),
                mode,
                blocking: true,
                result: TaskResult::failed(
                    vec![Diagnostic::message_only(
                        format!("Unknown task id '{id}' referenced by stage"),
                        Severity::Error,
                    )],
                    std::time::Duration::ZERO,
                ),
                fix: None,
            };
        };

        if mode.wants_fix() && !task.supports_fix() {
            return TaskRunResult {
                task_id: id.to_string(),
                task_name: task.name().to_string(),
                mode,
                blocking: task.is_blocking(),
                result: TaskResult::failed(
                    vec![Diagnostic::message_only(
                        format!("Task '{id}' does not support fix mode"),
                        Severity::Error,
                    )],
                    std::time::Duration::ZERO,
                ),
                fix: None,
            };
        }

        tracing::debug!(task = id, mode = mode.name(), "Running task");

        let (result, fix) = match mode {
            TaskMode::Check => (task.run(self.ctx), None),
            TaskMode::Fix => {
                // Best effort: fix errors live inside the FixResult;
                // the re-run check is what surfaces remaining issues.
                let fix = task.fix(self.ctx);
                let result = task.run(self.ctx);
                (result, Some(fix))
            }
            TaskMode::FixOnly => {
                let start = Instant::now();
                let fix = task.fix(self.ctx);
                let duration = start.elapsed();
                let result = if fix.is_clean() {
                    TaskResult::passed(duration, fix.modified_files.len())
                } else {
                    TaskResult::failed(
                        fix.errors
                            .iter()
                            .map(|e| Diagnostic::message_only(e.clone(), Severity::Error))
                            .collect(),
                        duration,
                    )
                };
                (result, Some(fix))
            }
        };

        TaskRunResult {
            task_id: id.to_string(),
            task_name: task.name().to_string(),
            mode,
            blocking: task.is_blocking(),
            result,
            fix,
        }
    }

    /// Entry for a task that was never invoked
    fn skipped_entry(&self, id: &str, mode: TaskMode, reason: &str) -> TaskRunResult {
        let (name, blocking) = self
            .registry
            .resolve(id)
            .map_or((id.to_string(), true), |t| {
                (t.name().to_string(), t.is_blocking())
            });
        TaskRunResult {
            task_id: id.to_string(),
            task_name: name,
            mode,
            blocking,
            result: TaskResult::skipped(reason),
            fix: None,
        }
    }
}
