//! Plain tool-invocation tasks
//!
//! Build, test and unused-code analysis share the same shape: run one
//! configured command against the tree, extract diagnostics from its
//! output, fail on a non-zero exit when blocking. They differ only in
//! defaults.

use super::{CommonMeta, HEAVY_HOOKS, ToolRun, ensure_failure_visible, launch_tool,
            unavailable_result};
use crate::resolver::ExecutableResolver;
use crate::task::HookTask;
use gantry_config::ToolCommandConfig;
use gantry_core::{HookContext, HookType, TaskResult, extract_diagnostics};
use std::sync::Arc;
use std::time::Instant;

/// A check that runs one external command
pub struct CommandTask {
    id: &'static str,
    display: &'static str,
    tool: String,
    args: Vec<String>,
    meta: CommonMeta,
    resolver: Arc<dyn ExecutableResolver>,
}

impl CommandTask {
    /// The build check (`cargo build` by default)
    #[must_use]
    pub fn build(config: &ToolCommandConfig, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self::from_parts("build", "Build", config, resolver, "cargo", &["build"], true)
    }

    /// The test check (`cargo test` by default)
    #[must_use]
    pub fn test(config: &ToolCommandConfig, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self::from_parts("test", "Test", config, resolver, "cargo", &["test"], true)
    }

    /// The unused-code check (`cargo-machete` by default, non-blocking)
    #[must_use]
    pub fn unused(config: &ToolCommandConfig, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self::from_parts("unused", "Unused code", config, resolver, "cargo-machete", &[], false)
    }

    fn from_parts(
        id: &'static str,
        display: &'static str,
        config: &ToolCommandConfig,
        resolver: Arc<dyn ExecutableResolver>,
        default_tool: &str,
        default_args: &[&str],
        default_blocking: bool,
    ) -> Self {
        Self {
            id,
            display,
            tool: config
                .tool
                .clone()
                .unwrap_or_else(|| default_tool.to_string()),
            args: config
                .args
                .clone()
                .unwrap_or_else(|| default_args.iter().map(ToString::to_string).collect()),
            meta: CommonMeta::resolve(&config.common, default_blocking, HEAVY_HOOKS, &[]),
            resolver,
        }
    }
}

impl HookTask for CommandTask {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.display
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
            &self.tool,
            self.args.clone(),
            &self.meta.env,
            ctx,
        ) {
            ToolRun::Unavailable(reason) => unavailable_result(reason, self.meta.required),
            ToolRun::Completed(output) => {
                let mut diagnostics =
                    extract_diagnostics(&output.combined(), self.meta.unmatched);
                ensure_failure_visible(&mut diagnostics, &output, &self.tool);
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

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::resolver::PathResolver;
    use gantry_core::{Scope, TaskStatus};
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn ctx() -> HookContext {
        HookContext::new(
            std::env::temp_dir(),
            HookType::Ci,
            Scope::All,
            vec![],
            vec![],
            false,
        )
        .unwrap()
    }

    fn resolver() -> Arc<dyn ExecutableResolver> {
        Arc::new(PathResolver::default())
    }

    fn shell_backed(config_args: &[&str]) -> CommandTask {
        let config = ToolCommandConfig {
            tool: Some("sh".to_string()),
            args: Some(config_args.iter().map(ToString::to_string).collect()),
            ..ToolCommandConfig::default()
        };
        CommandTask::build(&config, resolver())
    }

    #[test]
    fn test_defaults() {
        let task = CommandTask::build(&ToolCommandConfig::default(), resolver());
        assert_eq!(task.id(), "build");
        assert_eq!(task.tool, "cargo");
        assert_eq!(task.args, vec!["build"]);
        assert!(task.is_blocking());
        assert_eq!(task.hooks(), HEAVY_HOOKS);

        let unused = CommandTask::unused(&ToolCommandConfig::default(), resolver());
        assert!(!unused.is_blocking());
        assert_eq!(unused.tool, "cargo-machete");
    }

    #[test]
    fn test_passing_command() {
        let task = shell_backed(&["-c", "exit 0"]);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Passed);
    }

    #[test]
    fn test_failing_command_surfaces_exit_status() {
        let task = shell_backed(&["-c", "exit 7"]);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.diagnostics[0].message.contains("status 7"));
    }

    #[test]
    fn test_diagnostics_parsed_from_output() {
        let task = shell_backed(&["-c", "echo 'src/a.rs:3:9: warning: shadowed binding'; exit 1"]);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Failed);
        // Parsed warning plus the synthesized exit-status error.
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[0].line, Some(3));
    }

    #[test]
    fn test_missing_tool_skips() {
        let config = ToolCommandConfig {
            tool: Some("no-such-build-tool-xyz".to_string()),
            ..ToolCommandConfig::default()
        };
        let task = CommandTask::build(&config, resolver());
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(result.skip_reason.is_some());
    }

    #[test]
    fn test_missing_required_tool_fails() {
        let config = ToolCommandConfig {
            tool: Some("no-such-build-tool-xyz".to_string()),
            common: gantry_config::TaskCommonConfig {
                required: true,
                ..gantry_config::TaskCommonConfig::default()
            },
            ..ToolCommandConfig::default()
        };
        let task = CommandTask::build(&config, resolver());
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Failed);
    }

    #[test]
    fn test_dangling_override_skips_not_crashes() {
        let mut overrides = IndexMap::new();
        overrides.insert("cargo".to_string(), PathBuf::from("/no/such/cargo"));
        let task = CommandTask::build(
            &ToolCommandConfig::default(),
            Arc::new(PathResolver::new(overrides)),
        );
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Skipped);
    }
}
