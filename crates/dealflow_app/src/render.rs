//! Turns engine UI events into terminal lines.

use dealflow_core::{DealId, DealRow, Severity, TaskView, UiEvent};

pub fn render_event(event: &UiEvent) -> Vec<String> {
    match event {
        UiEvent::DealsRendered { rows, expanded } => render_deals(rows, *expanded),
        UiEvent::TasksLoading { deal_id } => vec![format!("  [{deal_id}] Loading tasks...")],
        UiEvent::TasksRendered { deal_id, tasks } => render_tasks(*deal_id, tasks),
        UiEvent::TaskRetryOffered { deal_id } => vec![format!(
            "  [{deal_id}] Failed to load tasks. Type `retry {deal_id}` to try again."
        )],
        UiEvent::Message { text, severity } => match severity {
            Severity::Info => vec![format!("* {text}")],
            Severity::Error => vec![format!("! {text}")],
        },
        // The terminal keeps no persistent message area.
        UiEvent::MessageCleared => Vec::new(),
        UiEvent::Loading(true) => vec!["Loading...".to_string()],
        UiEvent::Loading(false) => vec!["Idle.".to_string()],
    }
}

fn render_deals(rows: &[DealRow], expanded: Option<DealId>) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("Deals ({}):", rows.len())];
    for row in rows {
        let marker = if expanded == Some(row.id) { "v" } else { ">" };
        let created = row.created_display.as_deref().unwrap_or("-");
        lines.push(format!("{marker} {:<40} {:>10}  id={}", row.title, created, row.id));
    }
    lines
}

fn render_tasks(deal_id: DealId, tasks: &[TaskView]) -> Vec<String> {
    if tasks.is_empty() {
        return vec![format!("  [{deal_id}] No tasks")];
    }
    let mut lines = vec![format!("  [{deal_id}] Tasks:")];
    for task in tasks {
        let due = task.complete_till_display.as_deref().unwrap_or("no due date");
        lines.push(format!("    {} {} ({due})", task.status.hex(), task.text));
    }
    lines
}
