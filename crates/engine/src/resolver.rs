//! Executable resolution
//!
//! Tasks name the tools they invoke; the resolver turns a tool name
//! into a runnable path. The default implementation consults
//! configured overrides first, then `PATH`. A failed resolution is how
//! a task learns its tool is unavailable; tasks degrade to a skipped
//! result rather than erroring out of the run.

use gantry_core::{Error, Result};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Resolve a tool name to a runnable executable path
pub trait ExecutableResolver: Send + Sync {
    /// Resolve `tool` to an executable path
    fn resolve(&self, tool: &str) -> Result<PathBuf>;
}

/// PATH-based resolver with configured per-tool overrides
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    overrides: IndexMap<String, PathBuf>,
}

impl PathResolver {
    /// Create a resolver with tool path overrides from configuration
    #[must_use]
    pub fn new(overrides: IndexMap<String, PathBuf>) -> Self {
        Self { overrides }
    }
}

impl ExecutableResolver for PathResolver {
    fn resolve(&self, tool: &str) -> Result<PathBuf> {
        if let Some(path) = self.overrides.get(tool) {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(Error::TaskExecution(format!(
                "Configured path for '{tool}' does not exist: {}",
                path.display()
            )));
        }

        which::which(tool)
            .map_err(|e| Error::TaskExecution(format!("'{tool}' not found on PATH: {e}")))
    }
}
