//! Output formatting helpers for CLI commands

use crate::engine::{DeleteOutcome, OperationalStatus, Phase, ReconciliationOutcome, SliceStatus};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;

fn phase_cell(phase: Phase) -> String {
    match phase {
        Phase::Ready => "Ready".green().to_string(),
        Phase::Error => "Error".red().to_string(),
    }
}

fn operational_cell(status: OperationalStatus) -> String {
    match status {
        OperationalStatus::Up => "UP".green().to_string(),
        OperationalStatus::Down => "DOWN".yellow().to_string(),
        OperationalStatus::Error => "ERROR".red().to_string(),
    }
}

fn outcome_cell(outcome: &ReconciliationOutcome) -> String {
    match outcome {
        ReconciliationOutcome::Provisioned => "Provisioned".green().to_string(),
        ReconciliationOutcome::Reconciled => "Reconciled".cyan().to_string(),
        ReconciliationOutcome::InSync => "InSync".green().to_string(),
        ReconciliationOutcome::Error(_) => "Error".red().to_string(),
    }
}

/// Format a slice status as a per-router table followed by the summary line.
pub fn format_status_table(status: &SliceStatus) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Router", "Outcome", "Detail"]);

    for (router, outcome) in &status.outcomes {
        let detail = match outcome {
            ReconciliationOutcome::Error(message) => message.clone(),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(router),
            Cell::new(outcome_cell(outcome)),
            Cell::new(detail),
        ]);
    }

    let mut summary = format!("{} {}", status.service_type, phase_cell(status.phase));
    if let Some(operational) = status.operational_status {
        summary.push_str(&format!(" (operational: {})", operational_cell(operational)));
    }

    format!("{}\n{}\n{}", table, summary, status.message)
}

/// Format a delete outcome as a table of failed routers, if any.
pub fn format_delete_table(outcome: &DeleteOutcome) -> String {
    let headline = if outcome.success {
        format!("✓ {}", outcome.message).green().to_string()
    } else {
        format!("✗ {}", outcome.message).red().to_string()
    };

    if outcome.failures.is_empty() {
        return headline;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Router", "Error"]);
    for (router, error) in &outcome.failures {
        table.add_row(vec![Cell::new(router), Cell::new(error)]);
    }

    format!("{}\n{}", table, headline)
}

/// Pretty JSON for any serializable output.
pub fn format_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
