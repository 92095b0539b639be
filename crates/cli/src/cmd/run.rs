//! The `run` command: execute the stages for a lifecycle point

use super::OutputFormat;
use crate::common::RuntimeContext;
use crate::report;
use anyhow::{Context, Result};
use clap::Args;
use gantry_core::{HookContext, HookType, Scope};
use gantry_engine::git::FileDiscovery;

/// Run the checks configured for a lifecycle point
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Lifecycle point: pre-commit, pre-push or ci
    #[arg(value_name = "HOOK")]
    pub hook: String,

    /// Run fixable tasks in fix mode (fix, then re-check)
    #[arg(long)]
    pub fix: bool,

    /// File scope override: staged, changed, diff or all
    #[arg(long, value_name = "SCOPE")]
    pub scope: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl RunCommand {
    /// Execute the command, returning the process exit code
    pub fn execute(&self, context: &RuntimeContext) -> Result<i32> {
        let hook: HookType = self.hook.parse()?;
        let scope: Scope = match &self.scope {
            Some(scope) => scope.parse()?,
            None => hook.default_scope(),
        };

        tracing::debug!(hook = %hook, scope = ?scope, fix = self.fix, "Starting run");

        let discovery = FileDiscovery::new(&context.root, &context.config.general.base_ref);
        let (scoped, all) = discovery
            .discover(scope)
            .context("File discovery failed")?;

        let ctx = HookContext::new(&context.root, hook, scope, scoped, all, context.verbose)?;
        let runner = context.hook_runner()?;
        let report = runner.run(&ctx, self.fix)?;

        match self.format {
            OutputFormat::Human => report::print_report(&report),
            OutputFormat::Json => report::print_report_json(&report),
        }

        Ok(report.exit_code())
    }
}
