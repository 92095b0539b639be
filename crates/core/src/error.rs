//! Base error types for gantry
//!
//! This module provides the foundation error types that all crates can use.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path is not absolute
    #[error("Project root must be absolute: {path}")]
    RootNotAbsolute { path: PathBuf },

    /// Configuration error (bad config file, unknown task id, invalid
    /// stage definition). Always raised before any task runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid stage dependency graph (cycle or unknown stage name)
    #[error("Stage graph error: {0}")]
    Graph(String),

    /// Task execution error that could not be captured as a result
    #[error("Task execution error: {0}")]
    TaskExecution(String),

    /// Git discovery error
    #[error("Git error: {0}")]
    Git(String),

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
