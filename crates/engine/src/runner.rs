//! Composition root
//!
//! `HookRunner` turns a lifecycle trigger plus a fix-mode override
//! into a concrete stage list, validates it against the task registry
//! (configuration errors fail before any task runs), invokes the
//! stage scheduler, and wraps the outcome into a `RunReport` carrying
//! the final pass/fail decision.

use crate::stage::{BlockedStage, Stage, StageResult};
use crate::stage_runner::StageRunner;
use crate::task::TaskRegistry;
use gantry_config::Config;
use gantry_core::{Error, HookContext, HookType, Result, TaskMode};
use std::time::{Duration, Instant};

/// Final report of one invocation
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Lifecycle point that ran
    pub hook: HookType,
    /// Executed stages in completion-wave order
    pub stages: Vec<StageResult>,
    /// Stages that never started
    pub blocked: Vec<BlockedStage>,
    /// Wall-clock duration of the whole run
    pub duration: Duration,
}

impl RunReport {
    /// True when every stage that was not `continue_on_error`
    /// succeeded and nothing was blocked
    #[must_use]
    pub fn success(&self) -> bool {
        self.blocked.is_empty()
            && self
                .stages
                .iter()
                .all(|s| s.success || s.continue_on_error)
    }

    /// Process exit code for this report
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.success())
    }

    /// Total findings across all stages
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.stages.iter().map(StageResult::diagnostic_count).sum()
    }
}

/// Resolves triggers to stages and runs them
pub struct HookRunner {
    registry: TaskRegistry,
    config: Config,
}

impl HookRunner {
    /// Create a runner over a registry and configuration
    #[must_use]
    pub fn new(registry: TaskRegistry, config: Config) -> Self {
        Self { registry, config }
    }

    /// The task registry backing this runner
    #[must_use]
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run the stages configured for the context's lifecycle point
    ///
    /// `fix_override` upgrades check references to fix mode for tasks
    /// that support fixing.
    #[tracing::instrument(skip_all, fields(hook = %ctx.hook()))]
    pub fn run(&self, ctx: &HookContext, fix_override: bool) -> Result<RunReport> {
        let stages = self.resolve_stages(ctx.hook(), fix_override)?;
        self.validate_stages(&stages, ctx.hook())?;

        tracing::debug!(stages = stages.len(), "Resolved stage list");

        let start = Instant::now();
        let outcome = StageRunner::new(&self.registry, ctx).run(&stages)?;

        Ok(RunReport {
            hook: ctx.hook(),
            stages: outcome.stages,
            blocked: outcome.blocked,
            duration: start.elapsed(),
        })
    }

    /// Translate a trigger into the concrete stage list
    ///
    /// Order of precedence: a configured staged shape is used as-is;
    /// a configured legacy flat shape becomes one implicit stage; with
    /// no configuration at all, every registered task eligible for the
    /// trigger forms one sequential implicit stage.
    pub fn resolve_stages(&self, hook: HookType, fix_override: bool) -> Result<Vec<Stage>> {
        let mut stages: Vec<Stage> = match self.config.lifecycle(hook) {
            Some(lifecycle) => lifecycle
                .clone()
                .into_stages(hook.name())?
                .into_iter()
                .map(Stage::from_spec)
                .collect(),
            None => {
                let task_ids = self.registry.eligible_for(hook);
                let mut stage = Stage::new(hook.name());
                for id in task_ids {
                    stage = stage.task(id, TaskMode::Check);
                }
                vec![stage]
            }
        };

        if fix_override {
            for stage in &mut stages {
                for (id, mode) in &mut stage.tasks {
                    if *mode == TaskMode::Check
                        && let Some(task) = self.registry.resolve(id)
                        && task.supports_fix()
                    {
                        *mode = TaskMode::Fix;
                    }
                }
            }
        }

        Ok(stages)
    }

    /// Reject configurations that must never reach execution: unknown
    /// task ids and fix-mode references to tasks that cannot fix
    fn validate_stages(&self, stages: &[Stage], hook: HookType) -> Result<()> {
        for stage in stages {
            for (id, mode) in &stage.tasks {
                let Some(task) = self.registry.resolve(id) else {
                    return Err(Error::Config(format!(
                        "Stage '{}' references unknown task id '{id}'",
                        stage.name
                    )));
                };
                if mode.wants_fix() && !task.supports_fix() {
                    return Err(Error::Config(format!(
                        "Stage '{}' requests {} mode for task '{id}', which does not support fixing",
                        stage.name,
                        mode.name()
                    )));
                }
                if !task.hooks().contains(&hook) {
                    // Explicit configuration wins over eligibility
                    // metadata; just make it visible.
                    tracing::debug!(
                        task = %id,
                        stage = %stage.name,
                        hook = %hook,
                        "Task configured outside its declared lifecycle points"
                    );
                }
            }
        }
        Ok(())
    }
}
