//! Enumerations for TUI state management.

/// Which screen has keyboard focus.
///
/// The delete confirmation and the details overlay are drawn over the task
/// list and take input whenever they are open, whatever the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    TaskList,
    TaskForm,
    Help,
}
