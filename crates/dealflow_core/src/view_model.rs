use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::{Deal, DealId, Task};

const UNTITLED: &str = "Untitled";
const NO_DESCRIPTION: &str = "No description";

/// One entry of the rendered deal list; `id` also keys the deal's task panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealRow {
    pub id: DealId,
    pub name: Option<String>,
    pub created_at: Option<i64>,
    /// `"<position>. <name>"`, 1-based.
    pub title: String,
    pub created_display: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    /// Overdue.
    Red,
    /// Due later today.
    Green,
    /// Due another day, or no due date.
    Amber,
}

impl StatusColor {
    pub fn hex(self) -> &'static str {
        match self {
            StatusColor::Red => "#ff0000",
            StatusColor::Green => "#4CAF50",
            StatusColor::Amber => "#FFC107",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub text: String,
    pub complete_till_display: Option<String>,
    pub status: StatusColor,
}

pub fn build_deal_rows<Tz: TimeZone>(deals: &[Deal], tz: &Tz) -> Vec<DealRow>
where
    Tz::Offset: Display,
{
    deals
        .iter()
        .enumerate()
        .map(|(index, deal)| DealRow {
            id: deal.id,
            name: deal.name.clone(),
            created_at: deal.created_at,
            title: format!(
                "{}. {}",
                index + 1,
                deal.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(UNTITLED)
            ),
            created_display: deal
                .created_at
                .and_then(|ts| format_deal_date(ts, tz)),
        })
        .collect()
}

/// Sorts by due time ascending (missing due dates first) and derives a status per task.
pub fn build_task_views<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Vec<TaskView>
where
    Tz::Offset: Display,
{
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|task| task.complete_till.unwrap_or(0));

    let tz = now.timezone();
    sorted
        .into_iter()
        .map(|task| TaskView {
            text: task
                .text
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            complete_till_display: due_timestamp(task.complete_till)
                .and_then(|ts| format_task_date(ts, &tz)),
            status: task_status(task.complete_till, now),
        })
        .collect()
}

pub fn task_status<Tz: TimeZone>(complete_till: Option<i64>, now: &DateTime<Tz>) -> StatusColor {
    let Some(due) = due_timestamp(complete_till) else {
        return StatusColor::Amber;
    };
    if due < now.timestamp() {
        return StatusColor::Red;
    }
    match now.timezone().timestamp_opt(due, 0).single() {
        Some(due_at) if due_at.date_naive() == now.date_naive() => StatusColor::Green,
        _ => StatusColor::Amber,
    }
}

pub fn format_deal_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: Display,
{
    due_timestamp(Some(timestamp))
        .and_then(|ts| tz.timestamp_opt(ts, 0).single())
        .map(|at| at.format("%d.%m.%Y").to_string())
}

pub fn format_task_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: Display,
{
    tz.timestamp_opt(timestamp, 0)
        .single()
        .map(|at| at.format("%d.%m.%Y %H:%M:%S").to_string())
}

// Zero is what the API sends for "no date".
fn due_timestamp(value: Option<i64>) -> Option<i64> {
    value.filter(|ts| *ts != 0)
}
