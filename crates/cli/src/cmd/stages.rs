//! The `stages` command: show the resolved stage graph for a hook
//!
//! Resolves configuration exactly the way `run` would, without
//! executing anything, so a misconfigured graph can be inspected
//! safely.

use super::OutputFormat;
use crate::common::RuntimeContext;
use anyhow::Result;
use clap::Args;
use gantry_core::HookType;
use owo_colors::OwoColorize;

/// Show the resolved stage graph for a lifecycle point
#[derive(Debug, Args)]
pub struct StagesCommand {
    /// Lifecycle point: pre-commit, pre-push or ci
    #[arg(value_name = "HOOK")]
    pub hook: String,

    /// Resolve with the --fix upgrade applied
    #[arg(long)]
    pub fix: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl StagesCommand {
    /// Execute the command, returning the process exit code
    pub fn execute(&self, context: &RuntimeContext) -> Result<i32> {
        let hook: HookType = self.hook.parse()?;
        let runner = context.hook_runner()?;
        let stages = runner.resolve_stages(hook, self.fix)?;

        match self.format {
            OutputFormat::Json => {
                let stages: Vec<serde_json::Value> = stages
                    .iter()
                    .map(|stage| {
                        serde_json::json!({
                            "name": stage.name,
                            "parallel": stage.parallel,
                            "continueOnError": stage.continue_on_error,
                            "dependencies": stage.dependencies.iter().collect::<Vec<_>>(),
                            "tasks": stage
                                .tasks
                                .iter()
                                .map(|(id, mode)| {
                                    serde_json::json!({"id": id, "mode": mode.name()})
                                })
                                .collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({"hook": hook.name(), "stages": stages})
                    )?
                );
            }
            OutputFormat::Human => {
                println!(
                    "{} {} ({} stages)",
                    "Stage graph for".bold(),
                    hook.name().cyan(),
                    stages.len()
                );
                for stage in &stages {
                    let mut attrs = Vec::new();
                    if stage.parallel {
                        attrs.push("parallel".to_string());
                    }
                    if stage.continue_on_error {
                        attrs.push("continue-on-error".to_string());
                    }
                    if !stage.dependencies.is_empty() {
                        attrs.push(format!(
                            "after: {}",
                            stage
                                .dependencies
                                .iter()
                                .map(String::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ));
                    }
                    let suffix = if attrs.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", attrs.join("; "))
                    };
                    println!("\n{}{}", stage.name.green().bold(), suffix.dimmed());
                    for (id, mode) in &stage.tasks {
                        println!("  • {} [{}]", id, mode.name().cyan());
                    }
                }
            }
        }

        Ok(0)
    }
}
