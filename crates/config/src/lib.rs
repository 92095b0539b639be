//! Configuration management for gantry
//!
//! This crate handles:
//! - Loading and validating `gantry.json`
//! - Lifecycle (hook) to stage-list normalization, including the
//!   legacy flat task-list shape
//! - Per-task tool configuration
//! - Logging initialization

pub mod config;
pub mod logging;
pub mod stages;

// Re-export error types from core
pub use gantry_core::{Error, Result};

// Re-export main types
pub use config::{
    Config, DuplicatesConfig, FormatConfig, GeneralConfig, ShellConfig, TaskCommonConfig,
    TasksConfig, ToolCommandConfig, VersionSyncConfig, VersionTarget,
};
pub use stages::{LifecycleConfig, StageSpec, TaskRef};
