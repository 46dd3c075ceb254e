use colored::Colorize;
use vyos_config_core::{format_summary, format_text, DiffEntry, RuleCounters, ValidationIssue};

use crate::transform::Generation;

/// Render diff entries for terminal output.
pub fn render_text(entries: &[DiffEntry]) -> String {
    let raw = format_text(entries);
    let mut out = Vec::new();

    for line in raw.lines() {
        let colored = if line.starts_with('+') {
            line.green().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else if line.starts_with('~') {
            line.yellow().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render summary counts for terminal output.
pub fn render_summary(entries: &[DiffEntry]) -> String {
    format_summary(entries).cyan().to_string()
}

/// Render validation issues, one per line.
pub fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("! {}: {}", issue.path, issue.message).magenta().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the next free number of every rule counter.
pub fn render_counters(counters: &RuleCounters) -> String {
    let mut out = Vec::new();
    for name in counters.names() {
        let next = counters
            .counter(&name)
            .and_then(|counter| counter.peek().ok())
            .map_or_else(|| "exhausted".to_string(), |number| number.to_string());
        out.push(format!("- {name}: next={next}"));
    }
    out.join("\n")
}

/// Render a one-line summary of a generation run.
pub fn render_generation_summary(generation: &Generation, issues: usize) -> String {
    format!(
        "definitions={} counters={} issues={issues}",
        generation.definitions.len(),
        generation.counters.names().len()
    )
    .cyan()
    .to_string()
}
