//! Configuration loading
//!
//! `gantry.json` at the project root configures lifecycle stage lists,
//! per-task tool settings and tool path overrides. Every section is
//! optional; the built-in defaults give a usable run without any
//! configuration file at all.

use crate::Result;
use crate::stages::LifecycleConfig;
use gantry_core::{Error, HookType, UnmatchedLines};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "gantry.json";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Lifecycle name to stage list (staged or legacy flat shape)
    #[serde(default)]
    pub hooks: IndexMap<String, LifecycleConfig>,

    /// Per-task tool settings
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Tool name to executable path overrides
    #[serde(default)]
    pub tools: IndexMap<String, PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid {}: {e}", path.display())))
    }

    /// Load `gantry.json` from the project root, or defaults when the
    /// file does not exist
    pub fn discover(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = project_root.join(CONFIG_FILE);
        if default_path.exists() {
            tracing::debug!("Loading configuration from {}", default_path.display());
            Self::load(&default_path)
        } else {
            tracing::debug!("No {CONFIG_FILE} found, using defaults");
            Ok(Self::default())
        }
    }

    /// Take the lifecycle entry for a hook, if configured
    #[must_use]
    pub fn lifecycle(&self, hook: HookType) -> Option<&LifecycleConfig> {
        self.hooks.get(hook.name())
    }
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralConfig {
    /// Base ref for the `diff` scope
    #[serde(default = "default_base_ref")]
    pub base_ref: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_ref: default_base_ref(),
        }
    }
}

/// Settings shared by every task
///
/// Flattened into each task section, so no `deny_unknown_fields` on
/// the structs embedding it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCommonConfig {
    /// Override the task's default blocking flag
    #[serde(default)]
    pub blocking: Option<bool>,

    /// Override the lifecycle points the task participates in
    #[serde(default)]
    pub hooks: Option<Vec<HookType>>,

    /// Escalate a missing tool from skipped to failed
    #[serde(default)]
    pub required: bool,

    /// Extra environment for the tool subprocess
    #[serde(default)]
    pub env: IndexMap<String, String>,

    /// Glob patterns scoping which files the task considers
    #[serde(default)]
    pub file_patterns: Vec<String>,

    /// What to do with output lines that are not diagnostics
    #[serde(default)]
    pub unmatched_lines: UnmatchedLines,
}

/// Formatter task settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatConfig {
    /// Shared settings
    #[serde(flatten)]
    pub common: TaskCommonConfig,

    /// Formatter executable name
    #[serde(default)]
    pub tool: Option<String>,

    /// Arguments for check mode
    #[serde(default)]
    pub check_args: Option<Vec<String>>,

    /// Arguments for write (fix) mode
    #[serde(default)]
    pub write_args: Option<Vec<String>>,

    /// Append the in-scope file list to the argument vector
    #[serde(default = "default_true")]
    pub pass_files: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            common: TaskCommonConfig::default(),
            tool: None,
            check_args: None,
            write_args: None,
            pass_files: default_true(),
        }
    }
}

/// Settings for a plain tool-invocation task (build, test, unused,
/// duplicates)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCommandConfig {
    /// Shared settings
    #[serde(flatten)]
    pub common: TaskCommonConfig,

    /// Executable name
    #[serde(default)]
    pub tool: Option<String>,

    /// Argument vector
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// Duplicate-detection task settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatesConfig {
    /// Shared settings
    #[serde(flatten)]
    pub common: TaskCommonConfig,

    /// Executable name
    #[serde(default)]
    pub tool: Option<String>,

    /// Argument vector
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Findings tolerated before the task fails (when blocking)
    #[serde(default)]
    pub threshold: usize,
}

/// One version-sync target file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VersionTarget {
    /// File holding a version string to keep in sync
    pub file: PathBuf,

    /// Capture pattern for the version string in this file
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Version-sync task settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSyncConfig {
    /// Shared settings
    #[serde(flatten)]
    pub common: TaskCommonConfig,

    /// File holding the canonical version
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Capture pattern for the canonical version
    #[serde(default)]
    pub pattern: Option<String>,

    /// Files that must agree with the canonical version
    #[serde(default)]
    pub targets: Vec<VersionTarget>,
}

/// A user-defined shell-command task
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    /// Shared settings
    #[serde(flatten)]
    pub common: TaskCommonConfig,

    /// Command line, split with shell-style quoting
    pub command: String,

    /// Display name (defaults to the task id)
    #[serde(default)]
    pub name: Option<String>,
}

/// The closed vocabulary of built-in tasks plus user-defined shell
/// tasks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TasksConfig {
    /// Formatter settings
    #[serde(default)]
    pub format: FormatConfig,

    /// Build settings
    #[serde(default)]
    pub build: ToolCommandConfig,

    /// Test settings
    #[serde(default)]
    pub test: ToolCommandConfig,

    /// Version consistency settings
    #[serde(default)]
    pub version_sync: VersionSyncConfig,

    /// Unused-code analysis settings
    #[serde(default)]
    pub unused: ToolCommandConfig,

    /// Duplicate-detection settings
    #[serde(default)]
    pub duplicates: DuplicatesConfig,

    /// User-defined shell tasks, keyed by task id
    #[serde(default)]
    pub shell: IndexMap<String, ShellConfig>,
}

fn default_base_ref() -> String {
    "origin/main".to_string()
}

fn default_true() -> bool {
    true
}
