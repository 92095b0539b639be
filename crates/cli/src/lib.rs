//! Gantry CLI library
//!
//! This library contains all the CLI logic for gantry, making it
//! reusable for testing and integration with other tools.

pub mod cmd;
pub mod common;
pub mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use common::RuntimeContext;

/// Gantry - staged quality gates for git lifecycles
#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Run staged quality-gate checks around git hooks")]
#[command(version)]
#[command(long_about = "Run staged quality-gate checks around git hooks

A staged task scheduler for formatting, build, test, version
consistency and static-analysis checks, wired to pre-commit,
pre-push and CI lifecycle points.

Features:
  • Stage dependency graphs with concurrent execution
  • Check, fix and fix-only task modes
  • Tolerant diagnostic extraction from tool output
  • Legacy flat task lists and staged configuration")]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, env = "GANTRY_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Path to the config file (defaults to <root>/gantry.json)
    #[arg(long, env = "GANTRY_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (streams tool output live)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "GANTRY_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the gantry CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Run the checks for a lifecycle point
    Run(cmd::run::RunCommand),

    /// List registered tasks and their metadata
    Tasks(cmd::tasks::TasksCommand),

    /// Show the resolved stage graph for a lifecycle point
    Stages(cmd::stages::StagesCommand),
}

/// Run the CLI, returning the process exit code
pub fn run(cli: Cli) -> Result<i32> {
    gantry_config::logging::init(cli.verbose, cli.log_file.as_deref())
        .context("Failed to initialize logging")?;

    let context = RuntimeContext::resolve(cli.root, cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Run(command) => command.execute(&context),
        Commands::Tasks(command) => command.execute(&context),
        Commands::Stages(command) => command.execute(&context),
    }
}
