//! Report rendering
//!
//! Human output lists, per stage, per task: status, diagnostics with
//! `file:line:col` locations, and duration; blocked stages are listed
//! with the reason they never ran. The JSON form carries the same
//! content plus a top-level summary.

use gantry_core::{Severity, TaskStatus};
use gantry_engine::{RunReport, StageResult, TaskRunResult};
use owo_colors::OwoColorize;
use std::time::Duration;

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn fmt_duration(duration: Duration) -> String {
    if duration.as_secs() >= 10 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

fn status_glyph(status: TaskStatus, color: bool) -> String {
    match status {
        TaskStatus::Passed => {
            if color {
                "✓".green().to_string()
            } else {
                "✓".to_string()
            }
        }
        TaskStatus::Failed => {
            if color {
                "✗".red().to_string()
            } else {
                "✗".to_string()
            }
        }
        TaskStatus::Warning => {
            if color {
                "▲".yellow().to_string()
            } else {
                "▲".to_string()
            }
        }
        TaskStatus::Skipped => {
            if color {
                "–".dimmed().to_string()
            } else {
                "–".to_string()
            }
        }
    }
}

fn print_task(entry: &TaskRunResult, color: bool) {
    let glyph = status_glyph(entry.result.status, color);
    let mut line = format!(
        "  {glyph} {} [{}] {}",
        entry.task_name,
        entry.mode.name(),
        entry.result.status.name()
    );
    if entry.result.status == TaskStatus::Skipped {
        if let Some(reason) = &entry.result.skip_reason {
            line.push_str(&format!(" ({reason})"));
        }
    } else {
        line.push_str(&format!(
            " ({}, {} files)",
            fmt_duration(entry.result.duration),
            entry.result.files_checked
        ));
    }
    println!("{line}");

    if let Some(fix) = &entry.fix {
        if fix.fixes_applied > 0 {
            println!(
                "      fixed {} issue(s) in {} file(s)",
                fix.fixes_applied,
                fix.modified_files.len()
            );
        }
        for error in &fix.errors {
            let rendered = format!("      fix error: {error}");
            if color {
                println!("{}", rendered.yellow());
            } else {
                println!("{rendered}");
            }
        }
    }

    for diag in &entry.result.diagnostics {
        let rendered = format!("      {diag}");
        if !color {
            println!("{rendered}");
            continue;
        }
        match diag.severity {
            Severity::Error => println!("{}", rendered.red()),
            Severity::Warning => println!("{}", rendered.yellow()),
            Severity::Info => println!("{}", rendered.dimmed()),
        }
    }
}

fn print_stage(stage: &StageResult, color: bool) {
    let verdict = if stage.success { "passed" } else { "failed" };
    let count = stage.diagnostic_count();
    let suffix = match count {
        0 => String::new(),
        1 => " (1 diagnostic)".to_string(),
        n => format!(" ({n} diagnostics)"),
    };

    let header = format!("{}: {verdict}{suffix}", stage.name);
    if !color {
        println!("{header}");
    } else if stage.success {
        println!("{}", header.green().bold());
    } else {
        println!("{}", header.red().bold());
    }

    for entry in &stage.task_results {
        print_task(entry, color);
    }
}

/// Print the human-readable report
pub fn print_report(report: &RunReport) {
    let color = use_colors();

    for stage in &report.stages {
        print_stage(stage, color);
    }

    for blocked in &report.blocked {
        let line = format!("{}: skipped ({})", blocked.name, blocked.reason);
        if color {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }

    let passed = report
        .stages
        .iter()
        .filter(|s| s.success)
        .count();
    let summary = format!(
        "— {} — {passed}/{} stages passed, {} blocked, {} finding(s), {}",
        report.hook.name(),
        report.stages.len(),
        report.blocked.len(),
        report.diagnostic_count(),
        fmt_duration(report.duration)
    );
    let verdict = if report.success() { "PASSED" } else { "FAILED" };
    if !color {
        println!("{summary} — {verdict}");
    } else if report.success() {
        println!("{} {}", summary.bold(), verdict.green().bold());
    } else {
        println!("{} {}", summary.bold(), verdict.red().bold());
    }
}

/// Print the report as JSON
pub fn print_report_json(report: &RunReport) {
    let stages: Vec<serde_json::Value> = report
        .stages
        .iter()
        .map(|stage| {
            serde_json::json!({
                "name": stage.name,
                "success": stage.success,
                "continueOnError": stage.continue_on_error,
                "tasks": stage
                    .task_results
                    .iter()
                    .map(task_json)
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let blocked: Vec<serde_json::Value> = report
        .blocked
        .iter()
        .map(|b| serde_json::json!({"name": b.name, "reason": b.reason}))
        .collect();

    let out = serde_json::json!({
        "hook": report.hook.name(),
        "success": report.success(),
        "durationMs": report.duration.as_millis(),
        "stages": stages,
        "blocked": blocked,
        "summary": {
            "stages": report.stages.len(),
            "passed": report.stages.iter().filter(|s| s.success).count(),
            "blocked": report.blocked.len(),
            "diagnostics": report.diagnostic_count(),
        },
    });

    match serde_json::to_string_pretty(&out) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => tracing::error!(error = %e, "Failed to render JSON report"),
    }
}

fn task_json(entry: &TaskRunResult) -> serde_json::Value {
    let diagnostics: Vec<serde_json::Value> = entry
        .result
        .diagnostics
        .iter()
        .map(|d| {
            serde_json::json!({
                "file": d.file.as_ref().map(|p| p.display().to_string()),
                "line": d.line,
                "col": d.col,
                "severity": d.severity.name(),
                "message": d.message,
                "rule": d.rule,
                "fixable": d.fixable,
            })
        })
        .collect();

    let fix = entry.fix.as_ref().map(|f| {
        serde_json::json!({
            "modifiedFiles": f
                .modified_files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
            "fixesApplied": f.fixes_applied,
            "errors": f.errors,
        })
    });

    serde_json::json!({
        "id": entry.task_id,
        "name": entry.task_name,
        "mode": entry.mode.name(),
        "status": entry.result.status.name(),
        "durationMs": entry.result.duration.as_millis(),
        "filesChecked": entry.result.files_checked,
        "fixesAvailable": entry.result.fixes_available,
        "skipReason": entry.result.skip_reason,
        "diagnostics": diagnostics,
        "fix": fix,
    })
}
