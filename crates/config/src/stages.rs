//! Lifecycle and stage configuration
//!
//! A lifecycle entry in `gantry.json` is either the staged shape
//! (`{"stages": [...]}`) or the legacy flat shape
//! (`{"tasks": [...], "parallel": bool}`). The flat shape is purely a
//! parse-time alias: it normalizes into one implicit stage with no
//! dependencies, so the scheduler only ever sees stages.

use gantry_core::{Error, Result, TaskMode};
use serde::Deserialize;
use std::collections::BTreeSet;

/// A task reference inside a stage: either a bare id (check mode) or
/// an `{id, mode}` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
    /// Bare id, implies check mode
    Id(String),
    /// Explicit id and mode
    Full {
        /// Task identifier
        id: String,
        /// Execution mode for this reference
        #[serde(default)]
        mode: TaskMode,
    },
}

impl TaskRef {
    /// Task identifier this reference names
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            TaskRef::Id(id) => id,
            TaskRef::Full { id, .. } => id,
        }
    }

    /// Execution mode of this reference
    #[must_use]
    pub fn mode(&self) -> TaskMode {
        match self {
            TaskRef::Id(_) => TaskMode::Check,
            TaskRef::Full { mode, .. } => *mode,
        }
    }
}

/// One stage definition as written in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StageSpec {
    /// Stage name, unique within the run
    pub name: String,

    /// Ordered task references
    #[serde(default)]
    pub tasks: Vec<TaskRef>,

    /// Run the stage's tasks concurrently
    #[serde(default)]
    pub parallel: bool,

    /// Names of stages that must complete first (multi-parent DAG)
    #[serde(default)]
    pub dependencies: BTreeSet<String>,

    /// Legacy single-parent dependency field
    #[serde(default)]
    pub depends_on: Option<String>,

    /// Keep the run going even if this stage fails
    #[serde(default)]
    pub continue_on_error: bool,
}

impl StageSpec {
    /// Validate and fold `dependsOn` into `dependencies`
    ///
    /// A stage specifying both `dependencies` and the legacy
    /// `dependsOn` is rejected rather than silently merged.
    pub fn normalize(mut self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("Stage name cannot be empty".to_string()));
        }
        if let Some(parent) = self.depends_on.take() {
            if !self.dependencies.is_empty() {
                return Err(Error::Config(format!(
                    "Stage '{}' specifies both 'dependencies' and legacy 'dependsOn'; use one",
                    self.name
                )));
            }
            self.dependencies.insert(parent);
        }
        Ok(self)
    }
}

/// Flat legacy lifecycle shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlatSpec {
    /// Ordered task references
    pub tasks: Vec<TaskRef>,

    /// Run the tasks concurrently
    #[serde(default)]
    pub parallel: bool,
}

/// A lifecycle entry: staged shape or legacy flat shape
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LifecycleConfig {
    /// Canonical staged shape
    Staged {
        /// Stage definitions forming a DAG
        stages: Vec<StageSpec>,
    },
    /// Legacy flat task list, normalized into one implicit stage
    Flat(FlatSpec),
}

impl LifecycleConfig {
    /// Normalize into the canonical stage list
    ///
    /// The flat shape becomes one implicit stage named after the
    /// lifecycle, with no dependencies and `continueOnError: false`.
    pub fn into_stages(self, lifecycle: &str) -> Result<Vec<StageSpec>> {
        match self {
            LifecycleConfig::Staged { stages } => {
                stages.into_iter().map(StageSpec::normalize).collect()
            }
            LifecycleConfig::Flat(flat) => Ok(vec![StageSpec {
                name: lifecycle.to_string(),
                tasks: flat.tasks,
                parallel: flat.parallel,
                dependencies: BTreeSet::new(),
                depends_on: None,
                continue_on_error: false,
            }]),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_task_ref_bare_id() {
        let task: TaskRef = serde_json::from_value(serde_json::json!("format")).unwrap();
        assert_eq!(task.id(), "format");
        assert_eq!(task.mode(), TaskMode::Check);
    }

    #[test]
    fn test_task_ref_with_mode() {
        let task: TaskRef =
            serde_json::from_value(serde_json::json!({"id": "format", "mode": "fixOnly"}))
                .unwrap();
        assert_eq!(task.id(), "format");
        assert_eq!(task.mode(), TaskMode::FixOnly);
    }

    #[test]
    fn test_flat_shape_normalizes_to_implicit_stage() {
        let config: LifecycleConfig = serde_json::from_value(serde_json::json!({
            "tasks": ["format", "test"],
            "parallel": true
        }))
        .unwrap();

        let stages = config.into_stages("pre-commit").unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name, "pre-commit");
        assert!(stages[0].parallel);
        assert!(stages[0].dependencies.is_empty());
        assert!(!stages[0].continue_on_error);
        assert_eq!(stages[0].tasks.len(), 2);
    }

    #[test]
    fn test_staged_shape_parses() {
        let config: LifecycleConfig = serde_json::from_value(serde_json::json!({
            "stages": [
                {"name": "fix", "tasks": [{"id": "format", "mode": "fix"}], "parallel": false},
                {
                    "name": "quality",
                    "tasks": ["unused", "duplicates"],
                    "parallel": true,
                    "dependencies": ["fix"],
                    "continueOnError": true
                }
            ]
        }))
        .unwrap();

        let stages = config.into_stages("pre-push").unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1].name, "quality");
        assert!(stages[1].dependencies.contains("fix"));
        assert!(stages[1].continue_on_error);
    }

    #[test]
    fn test_depends_on_folds_into_dependencies() {
        let spec: StageSpec = serde_json::from_value(serde_json::json!({
            "name": "test",
            "tasks": ["test"],
            "dependsOn": "build"
        }))
        .unwrap();

        let spec = spec.normalize().unwrap();
        assert!(spec.dependencies.contains("build"));
    }

    #[test]
    fn test_both_dependency_fields_rejected() {
        let spec: StageSpec = serde_json::from_value(serde_json::json!({
            "name": "test",
            "tasks": ["test"],
            "dependencies": ["build"],
            "dependsOn": "lint"
        }))
        .unwrap();

        let err = spec.normalize().unwrap_err();
        assert!(err.to_string().contains("dependsOn"));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_empty_stage_name_rejected() {
        let spec: StageSpec = serde_json::from_value(serde_json::json!({
            "name": "  ",
            "tasks": []
        }))
        .unwrap();

        assert!(spec.normalize().is_err());
    }
}
