//! Core types for gantry
//!
//! This is the foundation crate (Layer 0) that all other gantry crates
//! depend on. It provides:
//! - The invocation context (`HookContext`, `HookType`, `Scope`)
//! - Normalized findings (`Diagnostic`, `Severity`)
//! - Task outcomes (`TaskResult`, `TaskStatus`, `FixResult`)
//! - Base error types
//!
//! This crate has no dependencies on other gantry crates.

pub mod context;
pub mod diagnostic;
pub mod error;
pub mod result;

pub use context::{FileEntry, HookContext, HookType, Scope};
pub use diagnostic::{Diagnostic, Severity, UnmatchedLines, extract_diagnostics};
pub use error::{Error, Result};
pub use result::{FixResult, FixSafety, TaskMode, TaskResult, TaskStatus};
