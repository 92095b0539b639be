//! File discovery for the run context
//!
//! Translates a `Scope` into concrete file lists using git2. The
//! scheduler itself never touches git; this module only runs while
//! building the `HookContext`.

use gantry_core::{Error, FileEntry, Result, Scope};
use std::path::{Path, PathBuf};

fn git_err(e: git2::Error) -> Error {
    Error::Git(e.message().to_string())
}

/// Discovers the file sets a run operates on
pub struct FileDiscovery {
    root: PathBuf,
    base_ref: String,
}

impl FileDiscovery {
    /// Create a discovery rooted at the project tree
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_ref: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_ref: base_ref.into(),
        }
    }

    /// Compute `(scoped files, all tracked files)` for a scope
    ///
    /// Outside a git repository only `Scope::All` works (a plain
    /// directory walk honoring ignore files); the git-relative scopes
    /// are errors there.
    pub fn discover(&self, scope: Scope) -> Result<(Vec<FileEntry>, Vec<FileEntry>)> {
        let repo = match git2::Repository::discover(&self.root) {
            Ok(repo) => repo,
            Err(e) => {
                if scope == Scope::All {
                    let files = self.walk_files();
                    return Ok((files.clone(), files));
                }
                return Err(Error::Git(format!(
                    "{} is not inside a git repository ({}); only scope 'all' works without one",
                    self.root.display(),
                    e.message()
                )));
            }
        };

        let all = Self::tracked_files(&repo)?;
        let scoped = match scope {
            Scope::Staged => Self::staged_files(&repo)?,
            Scope::Changed => Self::changed_files(&repo)?,
            Scope::Diff => self.diff_files(&repo)?,
            Scope::All => all.clone(),
        };

        tracing::debug!(
            scope = ?scope,
            scoped = scoped.len(),
            tracked = all.len(),
            "Discovered files"
        );
        Ok((scoped, all))
    }

    /// Every file in the index
    fn tracked_files(repo: &git2::Repository) -> Result<Vec<FileEntry>> {
        let index = repo.index().map_err(git_err)?;
        Ok(index
            .iter()
            .map(|entry| FileEntry::new(bytes_to_path(&entry.path)))
            .collect())
    }

    /// Files staged in the index relative to HEAD, with their blob ids
    fn staged_files(repo: &git2::Repository) -> Result<Vec<FileEntry>> {
        let index = repo.index().map_err(git_err)?;

        // Unborn HEAD: everything in the index is staged.
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree().map_err(git_err)?),
            Err(_) => None,
        };

        let Some(tree) = head_tree else {
            return Ok(index
                .iter()
                .map(|entry| {
                    FileEntry::staged(bytes_to_path(&entry.path), entry.id.to_string())
                })
                .collect());
        };

        let diff = repo
            .diff_tree_to_index(Some(&tree), Some(&index), None)
            .map_err(git_err)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            if delta.status() == git2::Delta::Deleted {
                continue;
            }
            if let Some(path) = delta.new_file().path() {
                files.push(FileEntry::staged(path, delta.new_file().id().to_string()));
            }
        }
        Ok(files)
    }

    /// Files changed in the working tree or index relative to HEAD
    fn changed_files(repo: &git2::Repository) -> Result<Vec<FileEntry>> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .exclude_submodules(true);

        let statuses = repo.statuses(Some(&mut opts)).map_err(git_err)?;
        let mut files = Vec::new();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.intersects(
                git2::Status::WT_NEW
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE
                    | git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE,
            ) && let Some(path) = entry.path()
            {
                files.push(FileEntry::new(path));
            }
        }
        Ok(files)
    }

    /// Files changed relative to the base ref (falls back to HEAD when
    /// the ref does not exist)
    fn diff_files(&self, repo: &git2::Repository) -> Result<Vec<FileEntry>> {
        let tree = match repo.revparse_single(&self.base_ref) {
            Ok(obj) => obj
                .peel(git2::ObjectType::Tree)
                .map_err(git_err)?
                .into_tree()
                .map_err(|_| Error::Git(format!("'{}' is not a tree", self.base_ref)))?,
            Err(_) => {
                tracing::debug!(base_ref = %self.base_ref, "Base ref not found, diffing against HEAD");
                match repo.head() {
                    Ok(head) => head.peel_to_tree().map_err(git_err)?,
                    Err(e) => return Err(git_err(e)),
                }
            }
        };

        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&tree), None)
            .map_err(git_err)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            if delta.status() == git2::Delta::Deleted {
                continue;
            }
            if let Some(path) = delta.new_file().path() {
                files.push(FileEntry::new(path));
            }
        }
        Ok(files)
    }

    /// Plain directory walk for non-repository trees
    fn walk_files(&self) -> Vec<FileEntry> {
        ignore::WalkBuilder::new(&self.root)
            .hidden(true)
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|rel| FileEntry::new(rel))
            })
            .collect()
    }
}

fn bytes_to_path(bytes: &[u8]) -> &Path {
    Path::new(std::str::from_utf8(bytes).unwrap_or(""))
}
