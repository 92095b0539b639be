//! Shared runtime state for CLI commands
//!
//! Resolves the project root and configuration once; commands build
//! what they need (registry, context) from here.

use anyhow::{Context, Result};
use gantry_config::Config;
use gantry_engine::tasks::builtin_registry;
use gantry_engine::{HookRunner, PathResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved state shared by every command
pub struct RuntimeContext {
    /// Absolute project root
    pub root: PathBuf,
    /// Loaded configuration
    pub config: Config,
    /// Stream tool output live
    pub verbose: bool,
}

impl RuntimeContext {
    /// Resolve the root and load configuration
    pub fn resolve(
        root: Option<PathBuf>,
        config_path: Option<&Path>,
        verbose: bool,
    ) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("Cannot determine current directory")?,
        };
        let root = root
            .canonicalize()
            .with_context(|| format!("Project root does not exist: {}", root.display()))?;

        let config = Config::discover(&root, config_path)
            .with_context(|| "Failed to load configuration")?;

        Ok(Self {
            root,
            config,
            verbose,
        })
    }

    /// Build the hook runner: task registry over the configured tools
    pub fn hook_runner(&self) -> Result<HookRunner> {
        let resolver = Arc::new(PathResolver::new(self.config.tools.clone()));
        let registry = builtin_registry(&self.config, resolver)
            .context("Failed to build task registry")?;
        Ok(HookRunner::new(registry, self.config.clone()))
    }
}
