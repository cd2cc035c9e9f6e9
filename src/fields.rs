//! Enumerations and filter types for task fields.
//!
//! This module defines the status and priority values the TaskFlow service
//! stores on each task, and the `Filter` wrapper used both when asking the
//! server for a list and when narrowing the in-memory snapshot.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A closed set of wire values a task field can take.
pub trait Choice: Copy + PartialEq + 'static {
    /// Every known value, in display order.
    const CHOICES: &'static [Self];

    /// The value as it appears on the wire and in query strings.
    fn as_str(self) -> &'static str;
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    #[value(alias = "in_progress")]
    InProgress,
    Done,
    /// Any value this client does not recognise yet.
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl Choice for Status {
    const CHOICES: &'static [Self] = &[Status::Todo, Status::InProgress, Status::Done];

    fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Unknown => "unknown",
        }
    }
}

/// Urgency level of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl Choice for Priority {
    const CHOICES: &'static [Self] = &[Priority::Low, Priority::Medium, Priority::High];

    fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Unknown => "unknown",
        }
    }
}

/// An active list filter on one field: everything, or one exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: Choice> Filter<T> {
    /// Whether a task field value passes this filter.
    ///
    /// This is the single matching rule; the list query built from
    /// `query_value` asks the server for the same subset.
    pub fn matches(&self, value: T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => *wanted == value,
        }
    }

    /// The query-string value to send, or `None` when the parameter must be omitted.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Filter::All => None,
            Filter::Only(v) => Some(v.as_str()),
        }
    }

    /// Step through `all` followed by every known value, wrapping around.
    pub fn cycle(self, forward: bool) -> Self {
        let choices = T::CHOICES;
        let position = match self {
            Filter::All => None,
            Filter::Only(v) => choices.iter().position(|c| *c == v),
        };
        // Index 0 stands for `all`, 1..=len for the choices.
        let slots = choices.len() + 1;
        let current = position.map(|p| p + 1).unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        if next == 0 {
            Filter::All
        } else {
            Filter::Only(choices[next - 1])
        }
    }

    /// Short label for headers and status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Only(v) => v.as_str(),
        }
    }
}

impl<T> From<Option<T>> for Filter<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Filter::Only(v),
            None => Filter::All,
        }
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "To Do",
        Status::InProgress => "In Progress",
        Status::Done => "Done",
        Status::Unknown => "Unknown",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Unknown => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_wire_values_decode_to_unknown() {
        let s: Status = serde_json::from_str("\"blocked\"").unwrap();
        let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(s, Status::Unknown);
        assert_eq!(p, Priority::Unknown);
    }

    #[test]
    fn in_progress_uses_snake_case_on_the_wire() {
        let s: Status = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, Status::InProgress);
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn all_filter_matches_everything_and_is_never_sent() {
        let f: Filter<Status> = Filter::All;
        assert!(f.matches(Status::Todo));
        assert!(f.matches(Status::Unknown));
        assert_eq!(f.query_value(), None);
    }

    #[test]
    fn only_filter_matches_exact_value() {
        let f = Filter::Only(Priority::High);
        assert!(f.matches(Priority::High));
        assert!(!f.matches(Priority::Low));
        assert!(!f.matches(Priority::Unknown));
        assert_eq!(f.query_value(), Some("high"));
    }

    #[test]
    fn cycle_walks_all_then_each_choice() {
        let mut f: Filter<Status> = Filter::All;
        let mut seen = Vec::new();
        for _ in 0..4 {
            f = f.cycle(true);
            seen.push(f.label());
        }
        assert_eq!(seen, vec!["todo", "in_progress", "done", "all"]);
        assert_eq!(Filter::<Status>::All.cycle(false), Filter::Only(Status::Done));
    }
}
