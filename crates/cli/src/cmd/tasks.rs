//! The `tasks` command: list registered tasks

use super::OutputFormat;
use crate::common::RuntimeContext;
use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

/// List registered tasks and their metadata
#[derive(Debug, Args)]
pub struct TasksCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl TasksCommand {
    /// Execute the command, returning the process exit code
    pub fn execute(&self, context: &RuntimeContext) -> Result<i32> {
        let runner = context.hook_runner()?;
        let registry = runner.registry();

        match self.format {
            OutputFormat::Json => {
                let tasks: Vec<serde_json::Value> = registry
                    .iter()
                    .map(|task| {
                        serde_json::json!({
                            "id": task.id(),
                            "name": task.name(),
                            "hooks": task.hooks().iter().map(|h| h.name()).collect::<Vec<_>>(),
                            "blocking": task.is_blocking(),
                            "supportsFix": task.supports_fix(),
                            "filePatterns": task.file_patterns(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({"tasks": tasks}))?
                );
            }
            OutputFormat::Human => {
                println!("{} ({} tasks)", "Registered tasks:".bold(), registry.len());
                for task in registry.iter() {
                    let hooks = task
                        .hooks()
                        .iter()
                        .map(gantry_core::HookType::name)
                        .collect::<Vec<_>>()
                        .join(", ");
                    let mut traits = Vec::new();
                    if task.is_blocking() {
                        traits.push("blocking");
                    }
                    if task.supports_fix() {
                        traits.push("fixable");
                    }
                    let suffix = if traits.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", traits.join(", "))
                    };
                    println!(
                        "  • {} — {} ({hooks}){}",
                        task.id().green(),
                        task.name(),
                        suffix.dimmed()
                    );
                }
            }
        }

        Ok(0)
    }
}
