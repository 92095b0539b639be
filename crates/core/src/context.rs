//! Invocation context
//!
//! Defines the immutable context a run executes against: the project
//! root, which lifecycle point triggered the run, which files are in
//! scope, and the verbosity flag. Built once per invocation and shared
//! read-only across concurrently running tasks.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle point that triggered the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookType {
    /// Before a commit is created
    PreCommit,
    /// Before refs are pushed
    PrePush,
    /// Continuous integration
    Ci,
}

impl HookType {
    /// Get the lifecycle name as used in configuration and git
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            HookType::PreCommit => "pre-commit",
            HookType::PrePush => "pre-push",
            HookType::Ci => "ci",
        }
    }

    /// Default file scope for this lifecycle point
    #[must_use]
    pub fn default_scope(&self) -> Scope {
        match self {
            HookType::PreCommit => Scope::Staged,
            HookType::PrePush => Scope::Diff,
            HookType::Ci => Scope::All,
        }
    }
}

impl std::str::FromStr for HookType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre-commit" => Ok(HookType::PreCommit),
            "pre-push" => Ok(HookType::PrePush),
            "ci" => Ok(HookType::Ci),
            other => Err(Error::Config(format!(
                "Unknown hook '{other}' (expected pre-commit, pre-push or ci)"
            ))),
        }
    }
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which files tasks consider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Files staged in the git index
    Staged,
    /// Files changed in the working tree relative to HEAD
    Changed,
    /// Files changed relative to the configured base ref
    Diff,
    /// Every tracked file
    #[default]
    All,
}

impl std::str::FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "staged" => Ok(Scope::Staged),
            "changed" => Ok(Scope::Changed),
            "diff" => Ok(Scope::Diff),
            "all" => Ok(Scope::All),
            other => Err(Error::Config(format!(
                "Unknown scope '{other}' (expected staged, changed, diff or all)"
            ))),
        }
    }
}

/// One file relevant to the run
///
/// Staged entries additionally carry the index blob id so a task can
/// refer to the staged content rather than the working-tree copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the project root
    pub path: PathBuf,
    /// Index object id for staged entries
    pub blob: Option<String>,
}

impl FileEntry {
    /// Create an entry without a content handle
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blob: None,
        }
    }

    /// Create a staged entry with its index blob id
    #[must_use]
    pub fn staged(path: impl Into<PathBuf>, blob: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            blob: Some(blob.into()),
        }
    }
}

/// Immutable invocation context
///
/// Created once per invocation; tasks running concurrently all borrow
/// the same context. File lists sit behind `Arc` so cloning the
/// context is cheap.
#[derive(Debug, Clone)]
pub struct HookContext {
    project_root: PathBuf,
    hook: HookType,
    scope: Scope,
    staged_files: Arc<[FileEntry]>,
    all_files: Arc<[FileEntry]>,
    verbose: bool,
}

impl HookContext {
    /// Create a new context
    ///
    /// # Errors
    ///
    /// Returns an error if `project_root` is not absolute.
    pub fn new(
        project_root: impl Into<PathBuf>,
        hook: HookType,
        scope: Scope,
        staged_files: Vec<FileEntry>,
        all_files: Vec<FileEntry>,
        verbose: bool,
    ) -> Result<Self> {
        let project_root = project_root.into();
        if !project_root.is_absolute() {
            return Err(Error::RootNotAbsolute { path: project_root });
        }
        Ok(Self {
            project_root,
            hook,
            scope,
            staged_files: staged_files.into(),
            all_files: all_files.into(),
            verbose,
        })
    }

    /// Root of the tree being checked
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Lifecycle point that triggered the run
    #[must_use]
    pub fn hook(&self) -> HookType {
        self.hook
    }

    /// File scope of the run
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether tasks should stream subprocess output live
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Staged file entries (index content)
    #[must_use]
    pub fn staged_files(&self) -> &[FileEntry] {
        &self.staged_files
    }

    /// Every tracked file
    #[must_use]
    pub fn all_files(&self) -> &[FileEntry] {
        &self.all_files
    }

    /// The file set matching the run's scope
    ///
    /// `Changed` and `Diff` scopes are materialized into `staged_files`
    /// by the discovery layer, so they share its slot here.
    #[must_use]
    pub fn files_in_scope(&self) -> &[FileEntry] {
        match self.scope {
            Scope::Staged | Scope::Changed | Scope::Diff => &self.staged_files,
            Scope::All => &self.all_files,
        }
    }

    /// Files in scope matching any of the given glob patterns
    ///
    /// An empty pattern list matches everything (a task without
    /// `file_patterns` considers the whole scope).
    #[must_use]
    pub fn files_matching(&self, patterns: &[String]) -> Vec<&FileEntry> {
        let files = self.files_in_scope();
        if patterns.is_empty() {
            return files.iter().collect();
        }

        let compiled: Vec<glob::Pattern> = patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        files
            .iter()
            .filter(|entry| {
                compiled.iter().any(|pat| {
                    pat.matches_path(&entry.path)
                        || entry
                            .path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| pat.matches(n))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn context_with(scope: Scope, staged: Vec<FileEntry>, all: Vec<FileEntry>) -> HookContext {
        HookContext::new("/project", HookType::PreCommit, scope, staged, all, false).unwrap()
    }

    #[test]
    fn test_rejects_relative_root() {
        let result = HookContext::new(
            "relative/path",
            HookType::Ci,
            Scope::All,
            vec![],
            vec![],
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(HookType::PreCommit.name(), "pre-commit");
        assert_eq!(HookType::PrePush.name(), "pre-push");
        assert_eq!(HookType::Ci.name(), "ci");
    }

    #[test]
    fn test_hook_from_str() {
        assert_eq!(
            "pre-commit".parse::<HookType>().unwrap(),
            HookType::PreCommit
        );
        assert!("post-merge".parse::<HookType>().is_err());
    }

    #[test]
    fn test_default_scopes() {
        assert_eq!(HookType::PreCommit.default_scope(), Scope::Staged);
        assert_eq!(HookType::PrePush.default_scope(), Scope::Diff);
        assert_eq!(HookType::Ci.default_scope(), Scope::All);
    }

    #[test]
    fn test_files_in_scope_staged() {
        let ctx = context_with(
            Scope::Staged,
            vec![FileEntry::staged("src/a.rs", "abc123")],
            vec![FileEntry::new("src/a.rs"), FileEntry::new("src/b.rs")],
        );
        assert_eq!(ctx.files_in_scope().len(), 1);
        assert_eq!(ctx.files_in_scope()[0].blob.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_files_in_scope_all() {
        let ctx = context_with(
            Scope::All,
            vec![FileEntry::new("src/a.rs")],
            vec![FileEntry::new("src/a.rs"), FileEntry::new("src/b.rs")],
        );
        assert_eq!(ctx.files_in_scope().len(), 2);
    }

    #[test]
    fn test_files_matching_empty_patterns_matches_all() {
        let ctx = context_with(
            Scope::All,
            vec![],
            vec![FileEntry::new("src/a.rs"), FileEntry::new("README.md")],
        );
        assert_eq!(ctx.files_matching(&[]).len(), 2);
    }

    #[test]
    fn test_files_matching_glob() {
        let ctx = context_with(
            Scope::All,
            vec![],
            vec![
                FileEntry::new("src/a.rs"),
                FileEntry::new("src/deep/b.rs"),
                FileEntry::new("README.md"),
            ],
        );
        let matched = ctx.files_matching(&["**/*.rs".to_string()]);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_files_matching_basename_pattern() {
        let ctx = context_with(
            Scope::All,
            vec![],
            vec![FileEntry::new("nested/dir/Cargo.toml")],
        );
        let matched = ctx.files_matching(&["Cargo.toml".to_string()]);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_context_clone_is_shallow() {
        let ctx = context_with(Scope::All, vec![], vec![FileEntry::new("a.rs")]);
        let clone = ctx.clone();
        assert_eq!(ctx.files_in_scope().len(), clone.files_in_scope().len());
    }
}
