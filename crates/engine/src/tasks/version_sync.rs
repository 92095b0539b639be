//! Version consistency task
//!
//! Reads the canonical version from a source file and verifies every
//! target file agrees. Native (no subprocess). Fix mode rewrites the
//! targets to the canonical version; already-synced targets are left
//! untouched, so fixing twice is a no-op.

use super::{ALL_HOOKS, CommonMeta};
use crate::task::HookTask;
use gantry_config::VersionSyncConfig;
use gantry_core::{
    Diagnostic, Error, FixResult, FixSafety, HookContext, HookType, Result, Severity, TaskResult,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

const DEFAULT_PATTERN: &str = r#"version\s*=\s*"([^"]+)""#;

/// Version string consistency check with fix support
#[derive(Debug)]
pub struct VersionSyncTask {
    source: PathBuf,
    pattern: regex::Regex,
    targets: Vec<(PathBuf, regex::Regex)>,
    meta: CommonMeta,
}

impl VersionSyncTask {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a pattern does not compile
    /// or lacks the capture group holding the version string.
    pub fn from_config(config: &VersionSyncConfig) -> Result<Self> {
        let pattern = compile_pattern(
            config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN),
            "versionSync.pattern",
        )?;

        let mut targets = Vec::with_capacity(config.targets.len());
        for target in &config.targets {
            let target_pattern = match &target.pattern {
                Some(p) => compile_pattern(p, &format!("pattern for {}", target.file.display()))?,
                None => pattern.clone(),
            };
            targets.push((target.file.clone(), target_pattern));
        }

        Ok(Self {
            source: config
                .source
                .clone()
                .unwrap_or_else(|| PathBuf::from("Cargo.toml")),
            pattern,
            targets,
            meta: CommonMeta::resolve(&config.common, true, ALL_HOOKS, &[]),
        })
    }

    /// Extract the canonical version from the source file
    fn canonical_version(&self, root: &Path) -> std::result::Result<String, String> {
        let path = root.join(&self.source);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read version source {}: {e}", self.source.display()))?;
        capture_version(&self.pattern, &content).ok_or_else(|| {
            format!(
                "no version found in {} matching the configured pattern",
                self.source.display()
            )
        })
    }
}

impl HookTask for VersionSyncTask {
    fn id(&self) -> &str {
        "version-sync"
    }

    fn name(&self) -> &str {
        "Version sync"
    }

    fn hooks(&self) -> &[HookType] {
        &self.meta.hooks
    }

    fn is_blocking(&self) -> bool {
        self.meta.blocking
    }

    fn supports_fix(&self) -> bool {
        true
    }

    fn fix_safety(&self) -> FixSafety {
        FixSafety::Cautious
    }

    fn run(&self, ctx: &HookContext) -> TaskResult {
        let start = Instant::now();
        if self.targets.is_empty() {
            return TaskResult::skipped("no version-sync targets configured");
        }

        let canonical = match self.canonical_version(ctx.project_root()) {
            Ok(version) => version,
            Err(reason) => {
                if self.meta.required {
                    return TaskResult::failed(
                        vec![Diagnostic::message_only(reason, Severity::Error)],
                        start.elapsed(),
                    );
                }
                return TaskResult::skipped(reason);
            }
        };

        let mut diagnostics = Vec::new();
        for (file, pattern) in &self.targets {
            let path = ctx.project_root().join(file);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    diagnostics.push(Diagnostic {
                        file: Some(file.clone()),
                        line: None,
                        col: None,
                        message: format!("cannot read version target: {e}"),
                        severity: Severity::Error,
                        rule: None,
                        fixable: false,
                    });
                    continue;
                }
            };

            match pattern.captures(&content) {
                None => diagnostics.push(Diagnostic {
                    file: Some(file.clone()),
                    line: None,
                    col: None,
                    message: "no version found matching the configured pattern".to_string(),
                    severity: Severity::Error,
                    rule: None,
                    fixable: false,
                }),
                Some(caps) => {
                    let found = caps.get(1).map_or("", |m| m.as_str());
                    if found != canonical {
                        let offset = caps.get(1).map_or(0, |m| m.start());
                        let (line, col) = line_col(&content, offset);
                        diagnostics.push(
                            Diagnostic {
                                file: Some(file.clone()),
                                line: Some(line),
                                col: Some(col),
                                message: format!(
                                    "version '{found}' does not match canonical '{canonical}'"
                                ),
                                severity: Severity::Error,
                                rule: None,
                                fixable: false,
                            }
                            .fixable(),
                        );
                    }
                }
            }
        }

        TaskResult::from_diagnostics(
            diagnostics,
            self.meta.blocking,
            false,
            start.elapsed(),
            self.targets.len() + 1,
        )
    }

    fn fix(&self, ctx: &HookContext) -> FixResult {
        let mut fix = FixResult::empty();
        let canonical = match self.canonical_version(ctx.project_root()) {
            Ok(version) => version,
            Err(reason) => {
                fix.errors.push(reason);
                return fix;
            }
        };

        for (file, pattern) in &self.targets {
            let path = ctx.project_root().join(file);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    fix.errors
                        .push(format!("cannot read {}: {e}", file.display()));
                    continue;
                }
            };

            let (rewritten, replaced) = replace_versions(pattern, &content, &canonical);
            if replaced == 0 {
                continue;
            }
            if let Err(e) = std::fs::write(&path, rewritten) {
                fix.errors
                    .push(format!("cannot write {}: {e}", file.display()));
                continue;
            }
            fix.record_modified(file.clone());
            fix.fixes_applied += replaced;
        }
        fix
    }
}

fn compile_pattern(pattern: &str, what: &str) -> Result<regex::Regex> {
    let compiled = regex::Regex::new(pattern)
        .map_err(|e| Error::Config(format!("Invalid {what}: {e}")))?;
    if compiled.captures_len() < 2 {
        return Err(Error::Config(format!(
            "Invalid {what}: needs one capture group holding the version"
        )));
    }
    Ok(compiled)
}

fn capture_version(pattern: &regex::Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Replace every captured version that differs from `canonical`;
/// returns the rewritten content and how many replacements were made
fn replace_versions(pattern: &regex::Regex, content: &str, canonical: &str) -> (String, usize) {
    // Collect ranges first, then rewrite back to front so earlier
    // offsets stay valid.
    let ranges: Vec<(usize, usize)> = pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .filter(|m| m.as_str() != canonical)
        .map(|m| (m.start(), m.end()))
        .collect();

    if ranges.is_empty() {
        return (content.to_string(), 0);
    }

    let mut rewritten = content.to_string();
    for (start, end) in ranges.iter().rev() {
        rewritten.replace_range(start..end, canonical);
    }
    (rewritten, ranges.len())
}

/// 1-based line and column of a byte offset
fn line_col(content: &str, offset: usize) -> (u32, u32) {
    let prefix = &content[..offset];
    let line = prefix.matches('\n').count() + 1;
    let col = offset - prefix.rfind('\n').map_or(0, |i| i + 1) + 1;
    (u32::try_from(line).unwrap_or(u32::MAX), u32::try_from(col).unwrap_or(u32::MAX))
}
