//! Duplicate-code detection task
//!
//! Runs the configured detector and applies a findings threshold:
//! findings at or under the threshold degrade to a warning, anything
//! above fails the task (when blocking).

use super::{CommonMeta, HEAVY_HOOKS, ToolRun, launch_tool, unavailable_result};
use crate::resolver::ExecutableResolver;
use crate::task::HookTask;
use gantry_config::DuplicatesConfig;
use gantry_core::{
    Diagnostic, HookContext, HookType, Severity, TaskResult, TaskStatus, extract_diagnostics,
};
use std::sync::Arc;
use std::time::Instant;

/// Duplicate-code check with a tolerance threshold
pub struct DuplicatesTask {
    tool: String,
    args: Vec<String>,
    threshold: usize,
    meta: CommonMeta,
    resolver: Arc<dyn ExecutableResolver>,
}

impl DuplicatesTask {
    /// Build from configuration (defaults: `jscpd`, threshold 0,
    /// non-blocking)
    #[must_use]
    pub fn from_config(config: &DuplicatesConfig, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self {
            tool: config.tool.clone().unwrap_or_else(|| "jscpd".to_string()),
            args: config.args.clone().unwrap_or_default(),
            threshold: config.threshold,
            meta: CommonMeta::resolve(&config.common, false, HEAVY_HOOKS, &[]),
            resolver,
        }
    }
}

impl HookTask for DuplicatesTask {
    fn id(&self) -> &str {
        "duplicates"
    }

    fn name(&self) -> &str {
        "Duplicates"
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
                let findings = diagnostics.len();

                let status = if findings > self.threshold {
                    if self.meta.blocking {
                        TaskStatus::Failed
                    } else {
                        TaskStatus::Warning
                    }
                } else if findings > 0 {
                    // Within tolerance: surfaced but never failing.
                    TaskStatus::Warning
                } else if output.success {
                    TaskStatus::Passed
                } else {
                    // The tool failed without reporting anything
                    // parseable.
                    let code = output
                        .code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string());
                    diagnostics.push(Diagnostic::message_only(
                        format!("{} exited with status {code}", self.tool),
                        Severity::Error,
                    ));
                    if self.meta.blocking {
                        TaskStatus::Failed
                    } else {
                        TaskStatus::Warning
                    }
                };

                if findings > self.threshold && self.threshold > 0 {
                    tracing::debug!(
                        findings,
                        threshold = self.threshold,
                        "Duplicate findings exceed threshold"
                    );
                }

                TaskResult {
                    status,
                    diagnostics,
                    duration: start.elapsed(),
                    files_checked,
                    fixes_available: false,
                    skip_reason: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::resolver::PathResolver;
    use gantry_core::Scope;

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

    fn task_with(script: &str, threshold: usize, blocking: bool) -> DuplicatesTask {
        let config = DuplicatesConfig {
            tool: Some("sh".to_string()),
            args: Some(vec!["-c".to_string(), script.to_string()]),
            threshold,
            common: gantry_config::TaskCommonConfig {
                blocking: Some(blocking),
                ..gantry_config::TaskCommonConfig::default()
            },
        };
        DuplicatesTask::from_config(&config, Arc::new(PathResolver::default()))
    }

    const TWO_FINDINGS: &str = "echo 'src/a.rs:1:1: warning: duplicated block'; \
                                echo 'src/b.rs:9:1: warning: duplicated block'; exit 0";

    #[test]
    fn test_clean_run_passes() {
        let task = task_with("exit 0", 0, true);
        assert_eq!(task.run(&ctx()).status, TaskStatus::Passed);
    }

    #[test]
    fn test_findings_over_threshold_fail_when_blocking() {
        let task = task_with(TWO_FINDINGS, 1, true);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn test_findings_within_threshold_warn() {
        let task = task_with(TWO_FINDINGS, 2, true);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Warning);
    }

    #[test]
    fn test_non_blocking_over_threshold_warns() {
        let task = task_with(TWO_FINDINGS, 0, false);
        assert_eq!(task.run(&ctx()).status, TaskStatus::Warning);
    }

    #[test]
    fn test_tool_failure_without_findings_is_visible() {
        let task = task_with("exit 4", 0, true);
        let result = task.run(&ctx());
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.diagnostics[0].message.contains("status 4"));
    }

    #[test]
    fn test_missing_tool_skips() {
        let config = DuplicatesConfig {
            tool: Some("no-such-duplicate-finder".to_string()),
            ..DuplicatesConfig::default()
        };
        let task = DuplicatesTask::from_config(&config, Arc::new(PathResolver::default()));
        assert_eq!(task.run(&ctx()).status, TaskStatus::Skipped);
    }
}
