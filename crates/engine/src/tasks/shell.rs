//! User-defined shell-command tasks
//!
//! A shell task runs one configured command line (split with
//! shell-style quoting, executed directly without a shell) and passes
//! iff the command exits zero. Never fixable.

use super::{CommonMeta, ALL_HOOKS, ToolRun, ensure_failure_visible, launch_tool,
            unavailable_result};
use crate::resolver::ExecutableResolver;
use crate::task::HookTask;
use gantry_config::ShellConfig;
use gantry_core::{Error, HookContext, HookType, Result, TaskResult, extract_diagnostics};
use std::sync::Arc;
use std::time::Instant;

/// One user-defined command task
pub struct ShellTask {
    id: String,
    display: String,
    program: String,
    args: Vec<String>,
    meta: CommonMeta,
    resolver: Arc<dyn ExecutableResolver>,
}

impl ShellTask {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the command line is empty
    /// or cannot be split.
    pub fn from_config(
        id: &str,
        config: &ShellConfig,
        resolver: Arc<dyn ExecutableResolver>,
    ) -> Result<Self> {
        let parts = shell_words::split(&config.command).map_err(|e| {
            Error::Config(format!("Task '{id}': cannot parse command: {e}"))
        })?;
        let Some((program, args)) = parts.split_first() else {
            return Err(Error::Config(format!("Task '{id}': empty command")));
        };

        Ok(Self {
            id: id.to_string(),
            display: config.name.clone().unwrap_or_else(|| id.to_string()),
            program: program.clone(),
            args: args.to_vec(),
            meta: CommonMeta::resolve(&config.common, true, ALL_HOOKS, &[]),
            resolver,
        })
    }
}

impl HookTask for ShellTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.display
    }

    fn hooks(&self) -> &[HookType] {
        &self.meta.hooks
    }

    fn is_blocking(&self) -> bool {
        self.meta.blocking
    }

    fn file_patterns(&self) -> &[String] {
        &self.meta.file_patterns
    }

    fn run(&self, ctx: &HookContext) -> TaskResult {
        let start = Instant::now();
        let files_checked = ctx.files_matching(&self.meta.file_patterns).len();

        match launch_tool(
            self.resolver.as_ref(),
            &self.program,
            self.args.clone(),
            &self.meta.env,
            ctx,
        ) {
            ToolRun::Unavailable(reason) => unavailable_result(reason, self.meta.required),
            ToolRun::Completed(output) => {
                let mut diagnostics =
                    extract_diagnostics(&output.combined(), self.meta.unmatched);
                ensure_failure_visible(&mut diagnostics, &output, &self.program);
                TaskResult::from_diagnostics(
                    diagnostics,
                    self.meta.blocking,
                    !output.success,
                    start.elapsed(),
                    files_checked,
                )
            }
        }
    }
}
