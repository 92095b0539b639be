//! Formatter task
//!
//! Check mode runs the formatter with its check arguments and treats a
//! non-zero exit as "needs formatting". Fix mode re-runs it with the
//! write arguments; this is the task's only write path.

use super::{ALL_HOOKS, CommonMeta, ToolRun, launch_tool, unavailable_result};
use crate::resolver::ExecutableResolver;
use crate::task::HookTask;
use gantry_config::FormatConfig;
use gantry_core::{
    Diagnostic, FixResult, FixSafety, HookContext, HookType, Severity, TaskResult,
    extract_diagnostics,
};
use std::sync::Arc;
use std::time::Instant;

/// Formatting check with fix support
pub struct FormatTask {
    tool: String,
    check_args: Vec<String>,
    write_args: Vec<String>,
    pass_files: bool,
    meta: CommonMeta,
    resolver: Arc<dyn ExecutableResolver>,
}

impl FormatTask {
    /// Build from configuration (defaults: `rustfmt --check` over
    /// `**/*.rs`)
    #[must_use]
    pub fn from_config(config: &FormatConfig, resolver: Arc<dyn ExecutableResolver>) -> Self {
        Self {
            tool: config.tool.clone().unwrap_or_else(|| "rustfmt".to_string()),
            check_args: config
                .check_args
                .clone()
                .unwrap_or_else(|| vec!["--check".to_string()]),
            write_args: config.write_args.clone().unwrap_or_default(),
            pass_files: config.pass_files,
            meta: CommonMeta::resolve(&config.common, true, ALL_HOOKS, &["**/*.rs"]),
            resolver,
        }
    }

    /// In-scope files as argument strings
    fn scoped_files(&self, ctx: &HookContext) -> Vec<String> {
        ctx.files_matching(&self.meta.file_patterns)
            .iter()
            .map(|entry| entry.path.to_string_lossy().into_owned())
            .collect()
    }

    fn argv(&self, base: &[String], files: &[String]) -> Vec<String> {
        let mut args = base.to_vec();
        if self.pass_files {
            args.extend(files.iter().cloned());
        }
        args
    }
}

impl HookTask for FormatTask {
    fn id(&self) -> &str {
        "format"
    }

    fn name(&self) -> &str {
        "Format"
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

    fn supports_fix(&self) -> bool {
        true
    }

    fn fix_safety(&self) -> FixSafety {
        FixSafety::Safe
    }

    fn run(&self, ctx: &HookContext) -> TaskResult {
        let start = Instant::now();
        let files = self.scoped_files(ctx);
        if self.pass_files && files.is_empty() {
            return TaskResult::passed(start.elapsed(), 0);
        }

        match launch_tool(
            self.resolver.as_ref(),
            &self.tool,
            self.argv(&self.check_args, &files),
            &self.meta.env,
            ctx,
        ) {
            ToolRun::Unavailable(reason) => unavailable_result(reason, self.meta.required),
            ToolRun::Completed(output) => {
                let mut diagnostics: Vec<Diagnostic> =
                    extract_diagnostics(&output.combined(), self.meta.unmatched)
                        .into_iter()
                        .map(|d| if d.file.is_some() { d.fixable() } else { d })
                        .collect();

                if !output.success
                    && !diagnostics.iter().any(|d| d.severity == Severity::Error)
                {
                    let code = output
                        .code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string());
                    diagnostics.push(
                        Diagnostic::message_only(
                            format!("{} reported formatting differences (exit {code})", self.tool),
                            Severity::Error,
                        )
                        .fixable(),
                    );
                }

                TaskResult::from_diagnostics(
                    diagnostics,
                    self.meta.blocking,
                    !output.success,
                    start.elapsed(),
                    files.len(),
                )
            }
        }
    }

    fn fix(&self, ctx: &HookContext) -> FixResult {
        let files = self.scoped_files(ctx);
        let mut fix = FixResult::empty();
        if self.pass_files && files.is_empty() {
            return fix;
        }

        match launch_tool(
            self.resolver.as_ref(),
            &self.tool,
            self.argv(&self.write_args, &files),
            &self.meta.env,
            ctx,
        ) {
            ToolRun::Unavailable(reason) => {
                fix.errors.push(reason);
                fix
            }
            ToolRun::Completed(output) => {
                // Formatters name the files they rewrote, one per
                // line; anything else in the output is noise.
                for line in output.combined().lines() {
                    let candidate = line.trim();
                    if candidate.is_empty() {
                        continue;
                    }
                    if ctx.project_root().join(candidate).is_file() {
                        fix.record_modified(candidate);
                    }
                }
                fix.fixes_applied = fix.modified_files.len();
                if !output.success {
                    let code = output
                        .code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string());
                    fix.errors
                        .push(format!("{} exited with status {code}", self.tool));
                }
                fix
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::resolver::PathResolver;
    use gantry_core::{FileEntry, Scope, TaskStatus};
    use tempfile::TempDir;

    fn ctx_with_files(root: &std::path::Path, files: Vec<FileEntry>) -> HookContext {
        HookContext::new(root, HookType::PreCommit, Scope::All, vec![], files, false).unwrap()
    }

    fn resolver() -> Arc<dyn ExecutableResolver> {
        Arc::new(PathResolver::default())
    }

    fn sh_config(check_script: &str) -> FormatConfig {
        FormatConfig {
            tool: Some("sh".to_string()),
            check_args: Some(vec!["-c".to_string(), check_script.to_string()]),
            write_args: Some(vec!["-c".to_string(), "exit 0".to_string()]),
            pass_files: false,
            ..FormatConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let task = FormatTask::from_config(&FormatConfig::default(), resolver());
        assert_eq!(task.id(), "format");
        assert_eq!(task.tool, "rustfmt");
        assert_eq!(task.check_args, vec!["--check"]);
        assert!(task.supports_fix());
        assert_eq!(task.fix_safety(), FixSafety::Safe);
    }

    #[test]
    fn test_no_files_in_scope_passes_without_launching() {
        let temp = TempDir::new().unwrap();
        let config = FormatConfig {
            tool: Some("definitely-missing-formatter".to_string()),
            ..FormatConfig::default()
        };
        let task = FormatTask::from_config(&config, resolver());
        // Missing tool would skip, but with no files the task never
        // launches it.
        let result = task.run(&ctx_with_files(temp.path(), vec![]));
        assert_eq!(result.status, TaskStatus::Passed);
        assert_eq!(result.files_checked, 0);
    }

    #[test]
    fn test_clean_tree_passes() {
        let temp = TempDir::new().unwrap();
        let task = FormatTask::from_config(&sh_config("exit 0"), resolver());
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("a.rs")]);
        assert_eq!(task.run(&ctx).status, TaskStatus::Passed);
    }

    #[test]
    fn test_dirty_tree_fails_with_fixable_diagnostic() {
        let temp = TempDir::new().unwrap();
        let task = FormatTask::from_config(&sh_config("exit 1"), resolver());
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("a.rs")]);

        let result = task.run(&ctx);
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.fixes_available);
        assert!(result.diagnostics[0].fixable);
    }

    #[test]
    fn test_parsed_location_diagnostics_are_fixable() {
        let temp = TempDir::new().unwrap();
        let task = FormatTask::from_config(
            &sh_config("echo 'src/a.rs:10:5: error: missing trailing comma'; exit 1"),
            resolver(),
        );
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("src/a.rs")]);

        let result = task.run(&ctx);
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].line, Some(10));
        assert!(result.diagnostics[0].fixable);
    }

    #[test]
    fn test_missing_tool_skips() {
        let temp = TempDir::new().unwrap();
        let config = FormatConfig {
            tool: Some("definitely-missing-formatter".to_string()),
            pass_files: false,
            ..FormatConfig::default()
        };
        let task = FormatTask::from_config(&config, resolver());
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("a.rs")]);
        assert_eq!(task.run(&ctx).status, TaskStatus::Skipped);
    }

    #[test]
    fn test_fix_reports_modified_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.rs"), "fn main(){}").unwrap();

        let config = FormatConfig {
            tool: Some("sh".to_string()),
            check_args: Some(vec!["-c".to_string(), "exit 1".to_string()]),
            // The fake formatter prints the file it "rewrote".
            write_args: Some(vec!["-c".to_string(), "echo a.rs".to_string()]),
            pass_files: false,
            ..FormatConfig::default()
        };
        let task = FormatTask::from_config(&config, resolver());
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("a.rs")]);

        let fix = task.fix(&ctx);
        assert!(fix.is_clean());
        assert_eq!(fix.fixes_applied, 1);
        assert_eq!(fix.modified_files, vec![std::path::PathBuf::from("a.rs")]);
    }

    #[test]
    fn test_fix_with_missing_tool_records_error() {
        let temp = TempDir::new().unwrap();
        let config = FormatConfig {
            tool: Some("definitely-missing-formatter".to_string()),
            pass_files: false,
            ..FormatConfig::default()
        };
        let task = FormatTask::from_config(&config, resolver());
        let ctx = ctx_with_files(temp.path(), vec![FileEntry::new("a.rs")]);

        let fix = task.fix(&ctx);
        assert!(!fix.is_clean());
        assert!(fix.modified_files.is_empty());
    }
}
