//! Built-in task implementations
//!
//! The task vocabulary is closed: format, build, test, version-sync,
//! unused, duplicates, plus user-defined shell commands. The registry
//! is built once at startup from configuration.
//!
//! Subprocess-backed tasks share one pattern: resolve the tool, build
//! an argument vector from context and configuration, invoke it with
//! the project root as working directory, and extract diagnostics
//! from the textual output. A tool that cannot be resolved or
//! launched degrades the task to a skipped result; it never crashes
//! the run.

pub mod command;
pub mod duplicates;
pub mod format;
pub mod shell;
pub mod version_sync;

pub use command::CommandTask;
pub use duplicates::DuplicatesTask;
pub use format::FormatTask;
pub use shell::ShellTask;
pub use version_sync::VersionSyncTask;

use crate::process::{Invocation, ProcessOutput};
use crate::resolver::ExecutableResolver;
use crate::task::TaskRegistry;
use gantry_config::{Config, TaskCommonConfig};
use gantry_core::{
    Diagnostic, HookContext, HookType, Result, Severity, TaskResult, UnmatchedLines,
};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

/// Every lifecycle point
pub(crate) const ALL_HOOKS: &[HookType] = &[HookType::PreCommit, HookType::PrePush, HookType::Ci];

/// Lifecycle points for expensive tasks (build, test, analysis)
pub(crate) const HEAVY_HOOKS: &[HookType] = &[HookType::PrePush, HookType::Ci];

/// Build the registry of built-in tasks plus configured shell tasks
pub fn builtin_registry(
    config: &Config,
    resolver: Arc<dyn ExecutableResolver>,
) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    registry.register(Arc::new(FormatTask::from_config(
        &config.tasks.format,
        resolver.clone(),
    )))?;
    registry.register(Arc::new(CommandTask::build(
        &config.tasks.build,
        resolver.clone(),
    )))?;
    registry.register(Arc::new(CommandTask::test(
        &config.tasks.test,
        resolver.clone(),
    )))?;
    registry.register(Arc::new(VersionSyncTask::from_config(
        &config.tasks.version_sync,
    )?))?;
    registry.register(Arc::new(CommandTask::unused(
        &config.tasks.unused,
        resolver.clone(),
    )))?;
    registry.register(Arc::new(DuplicatesTask::from_config(
        &config.tasks.duplicates,
        resolver.clone(),
    )))?;
    for (id, shell_config) in &config.tasks.shell {
        registry.register(Arc::new(ShellTask::from_config(
            id,
            shell_config,
            resolver.clone(),
        )?))?;
    }
    Ok(registry)
}

/// Settings every task shares, resolved against its defaults
#[derive(Debug, Clone)]
pub(crate) struct CommonMeta {
    pub blocking: bool,
    pub hooks: Vec<HookType>,
    pub required: bool,
    pub env: IndexMap<String, String>,
    pub file_patterns: Vec<String>,
    pub unmatched: UnmatchedLines,
}

impl CommonMeta {
    pub(crate) fn resolve(
        config: &TaskCommonConfig,
        default_blocking: bool,
        default_hooks: &[HookType],
        default_patterns: &[&str],
    ) -> Self {
        let file_patterns = if config.file_patterns.is_empty() {
            default_patterns.iter().map(ToString::to_string).collect()
        } else {
            config.file_patterns.clone()
        };
        Self {
            blocking: config.blocking.unwrap_or(default_blocking),
            hooks: config
                .hooks
                .clone()
                .unwrap_or_else(|| default_hooks.to_vec()),
            required: config.required,
            env: config.env.clone(),
            file_patterns,
            unmatched: config.unmatched_lines,
        }
    }
}

/// How launching a tool went
pub(crate) enum ToolRun {
    /// The tool ran to completion (whatever its exit code)
    Completed(ProcessOutput),
    /// The tool could not be resolved or launched
    Unavailable(String),
}

/// Resolve and run a tool with the project root as working directory
pub(crate) fn launch_tool(
    resolver: &dyn ExecutableResolver,
    tool: &str,
    args: Vec<String>,
    env: &IndexMap<String, String>,
    ctx: &HookContext,
) -> ToolRun {
    let program = match resolver.resolve(tool) {
        Ok(program) => program,
        Err(e) => return ToolRun::Unavailable(e.to_string()),
    };

    let invocation = Invocation::new(program, ctx.project_root())
        .args(args)
        .envs(env);

    match invocation.run(ctx.verbose()) {
        Ok(output) => ToolRun::Completed(output),
        Err(e) => ToolRun::Unavailable(e.to_string()),
    }
}

/// Result for a tool that never ran: skipped, unless the task is
/// configured as required
pub(crate) fn unavailable_result(reason: String, required: bool) -> TaskResult {
    if required {
        TaskResult::failed(
            vec![Diagnostic::message_only(
                format!("required tool unavailable: {reason}"),
                Severity::Error,
            )],
            Duration::ZERO,
        )
    } else {
        tracing::debug!(reason = %reason, "Tool unavailable, skipping task");
        TaskResult::skipped(reason)
    }
}

/// Append a message-only error when a tool failed without producing
/// any parseable error finding, so the failure is never silent
pub(crate) fn ensure_failure_visible(
    diagnostics: &mut Vec<Diagnostic>,
    output: &ProcessOutput,
    tool: &str,
) {
    if !output.success
        && !diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    {
        let code = output
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        diagnostics.push(Diagnostic::message_only(
            format!("{tool} exited with status {code}"),
            Severity::Error,
        ));
    }
}
