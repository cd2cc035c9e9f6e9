//! Pure derivation of what the board shows.
//!
//! `render_board` turns the snapshot and the active filters into a
//! `BoardView`: plain data the terminal layer paints without consulting any
//! other state. Calling it twice with the same inputs yields the same view.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::dates::{format_due_relative, to_input};
use crate::fields::{format_priority, format_status, Priority, Status};
use crate::store::TaskStore;
use crate::task::Task;

/// Visual emphasis of a badge; the terminal layer maps tones to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Pending,
    Active,
    Success,
    Calm,
    Warning,
    Danger,
}

/// A short label with an emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

pub fn status_badge(status: Status) -> Badge {
    let tone = match status {
        Status::Todo => Tone::Pending,
        Status::InProgress => Tone::Active,
        Status::Done => Tone::Success,
        Status::Unknown => Tone::Neutral,
    };
    Badge { label: format_status(status), tone }
}

pub fn priority_badge(priority: Priority) -> Badge {
    let tone = match priority {
        Priority::Low => Tone::Calm,
        Priority::Medium => Tone::Warning,
        Priority::High => Tone::Danger,
        Priority::Unknown => Tone::Neutral,
    };
    Badge { label: format_priority(priority), tone }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueLabel {
    /// Relative wording such as "tomorrow" or "2d late".
    pub relative: String,
    /// Local wall-clock time in the form's format.
    pub local: String,
    pub overdue: bool,
}

/// One task line on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub status: Badge,
    pub priority: Badge,
    pub due: Option<DueLabel>,
    pub completed: bool,
}

/// What the list area shows instead of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// An initial or manual load is in flight.
    Loading,
    /// The snapshot itself is empty.
    NoTasks,
    /// The snapshot has tasks but none pass the filters.
    NoMatches,
}

impl Placeholder {
    pub fn message(self) -> &'static str {
        match self {
            Placeholder::Loading => "Loading tasks...",
            Placeholder::NoTasks => "No tasks yet. Press 'n' to create one.",
            Placeholder::NoMatches => "No tasks match the current filters.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub rows: Vec<TaskRow>,
    pub placeholder: Option<Placeholder>,
    pub status_filter: &'static str,
    pub priority_filter: &'static str,
    /// Tasks in the snapshot.
    pub loaded: usize,
    /// Tasks the server reported for the last list request.
    pub total: u64,
}

/// Derive the board from the snapshot and its filters.
///
/// While a refresh is in flight the list area is cleared; the snapshot
/// itself is untouched until the response arrives.
pub fn render_board<Tz: TimeZone>(store: &TaskStore, refreshing: bool, now: &DateTime<Tz>) -> BoardView
where
    Tz::Offset: Display,
{
    let rows: Vec<TaskRow> = if refreshing {
        Vec::new()
    } else {
        store.derive_view().into_iter().map(|t| task_row(t, now)).collect()
    };

    let placeholder = if refreshing {
        Some(Placeholder::Loading)
    } else if store.tasks().is_empty() {
        Some(Placeholder::NoTasks)
    } else if rows.is_empty() {
        Some(Placeholder::NoMatches)
    } else {
        None
    };

    BoardView {
        rows,
        placeholder,
        status_filter: store.status_filter().label(),
        priority_filter: store.priority_filter().label(),
        loaded: store.tasks().len(),
        total: store.total(),
    }
}

fn task_row<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> TaskRow
where
    Tz::Offset: Display,
{
    let completed = task.is_completed || task.status == Status::Done;
    TaskRow {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone().filter(|d| !d.trim().is_empty()),
        status: status_badge(task.status),
        priority: priority_badge(task.priority),
        due: task.due_date.map(|due| due_label(due, completed, now)),
        completed,
    }
}

fn due_label<Tz: TimeZone>(due: DateTime<Utc>, completed: bool, now: &DateTime<Tz>) -> DueLabel
where
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let local_due = due.with_timezone(&tz);
    DueLabel {
        relative: format_due_relative(local_due.date_naive(), now.date_naive()),
        local: to_input(due, &tz),
        overdue: !completed && due < now.with_timezone(&Utc),
    }
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
