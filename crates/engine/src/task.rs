//! Task contract and registry
//!
//! A `HookTask` is one checkable (optionally fixable) property of the
//! project. Instances are immutable configuration built at startup;
//! concurrently running stages may execute distinct instances with no
//! shared mutable state between them.

use gantry_core::{Error, FixResult, FixSafety, HookContext, HookType, Result, TaskResult};
use indexmap::IndexMap;
use std::sync::Arc;

/// One checkable/fixable property of the project
///
/// `run` must be safe to call concurrently with other tasks' `run` and
/// must not mutate shared filesystem state. `fix` is only invoked when
/// `supports_fix` returns true, and must be idempotent: fixing an
/// already-clean tree produces an empty `FixResult`.
pub trait HookTask: Send + Sync {
    /// Unique identifier within a registry
    fn id(&self) -> &str;

    /// Human-readable name for reporting
    fn name(&self) -> &str;

    /// Lifecycle points this task is eligible for (never empty)
    fn hooks(&self) -> &[HookType];

    /// Whether a failure of this task fails its stage
    fn is_blocking(&self) -> bool {
        true
    }

    /// How risky this task's fix operation is
    fn fix_safety(&self) -> FixSafety {
        FixSafety::Safe
    }

    /// Glob patterns scoping which files the task considers
    fn file_patterns(&self) -> &[String] {
        &[]
    }

    /// Whether the task implements `fix`
    fn supports_fix(&self) -> bool {
        false
    }

    /// Run the check
    ///
    /// Failure to launch an underlying tool must surface as a
    /// `Skipped` result with a reason, never a panic or an `Err`
    /// bubbling out of the scheduler.
    fn run(&self, ctx: &HookContext) -> TaskResult;

    /// Apply fixes (best effort)
    ///
    /// Partial failure is recorded inside the returned `FixResult`.
    fn fix(&self, _ctx: &HookContext) -> FixResult {
        FixResult::empty()
    }
}

/// Registry mapping task ids to task instances
///
/// Built once at startup from configuration and passed into the
/// runner as an explicit value, so independent scheduler instances can
/// coexist (no process-wide singletons).
#[derive(Default)]
pub struct TaskRegistry {
    tasks: IndexMap<String, Arc<dyn HookTask>>,
}

impl TaskRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already registered or the task
    /// declares no lifecycle points.
    pub fn register(&mut self, task: Arc<dyn HookTask>) -> Result<()> {
        if task.hooks().is_empty() {
            return Err(Error::Config(format!(
                "Task '{}' declares no lifecycle points",
                task.id()
            )));
        }
        let id = task.id().to_string();
        if self.tasks.contains_key(&id) {
            return Err(Error::Config(format!("Duplicate task id '{id}'")));
        }
        tracing::debug!(task = %id, "Registered task");
        self.tasks.insert(id, task);
        Ok(())
    }

    /// Look up a task by id
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn HookTask>> {
        self.tasks.get(id).cloned()
    }

    /// Iterate tasks in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn HookTask>> {
        self.tasks.values()
    }

    /// Ids of tasks eligible for a lifecycle point, in registration
    /// order
    #[must_use]
    pub fn eligible_for(&self, hook: HookType) -> Vec<String> {
        self.tasks
            .values()
            .filter(|t| t.hooks().contains(&hook))
            .map(|t| t.id().to_string())
            .collect()
    }

    /// Number of registered tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no tasks are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
