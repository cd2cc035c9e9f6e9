//! Task form handling for the terminal user interface.
//!
//! `TaskForm` is both the entry form and its create/edit state machine. The
//! form is always in exactly one `FormMode`; `begin_edit`, `cancel_edit` and
//! `reset` are the only transitions. `submit` validates and builds the
//! request body but never changes the mode, so a failed request leaves the
//! form exactly as the user left it.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::{
    dates::{parse_due_input, to_input},
    error::ValidationError,
    fields::{Choice, Priority, Status},
    task::{NewTask, Task, TaskPatch},
    tui::input::InputField,
};

/// Field order for navigating the form.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const PRIORITY_FIELD: usize = 2;
pub const STATUS_FIELD: usize = 3;
pub const DUE_FIELD: usize = 4;
const FIELD_COUNT: usize = 5;

/// Whether the form creates a new task or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(u64),
}

/// A validated form, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(NewTask),
    Update(u64, TaskPatch),
}

/// Task form for creating and editing tasks.
#[derive(Debug, Clone)]
pub struct TaskForm {
    mode: FormMode,
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    /// Index into `Priority::CHOICES`; `None` when editing a task whose priority is unknown.
    pub priority: Option<usize>,
    /// Index into `Status::CHOICES`; only used in edit mode.
    pub status: Option<usize>,
    pub current_field: usize,
    /// Field flagged by the last failed validation.
    pub invalid_field: Option<usize>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// A blank form in create mode.
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            title: InputField::new(),
            description: InputField::new(),
            due: InputField::new(),
            priority: position(Priority::CHOICES, Priority::Medium),
            status: None,
            current_field: TITLE_FIELD,
            invalid_field: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn editing_id(&self) -> Option<u64> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(id),
        }
    }

    /// Switch to editing `task`, copying its current values into the fields.
    ///
    /// The due timestamp is shown in `tz`; a task without one leaves the field blank.
    pub fn begin_edit<Tz: TimeZone>(&mut self, task: &Task, tz: &Tz)
    where
        Tz::Offset: std::fmt::Display,
    {
        debug!(task_id = task.id, from = ?self.mode, "form entering edit mode");
        *self = Self {
            mode: FormMode::Edit(task.id),
            title: InputField::with_value(&task.title),
            description: InputField::with_value(task.description.as_deref().unwrap_or_default()),
            due: InputField::with_value(
                &task.due_date.map(|d| to_input(d, tz)).unwrap_or_default(),
            ),
            priority: position(Priority::CHOICES, task.priority),
            status: position(Status::CHOICES, task.status),
            current_field: TITLE_FIELD,
            invalid_field: None,
        };
    }

    /// Leave edit mode, discarding the edits. Returns false if already creating.
    pub fn cancel_edit(&mut self) -> bool {
        match self.mode {
            FormMode::Create => false,
            FormMode::Edit(id) => {
                debug!(task_id = id, "edit cancelled");
                self.reset();
                true
            }
        }
    }

    /// Back to a blank create form.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Validate the fields and build the request for the current mode.
    ///
    /// On a validation failure the offending field is flagged and focused;
    /// the mode and the entered values are left as they are.
    pub fn submit<Tz: TimeZone>(&mut self, tz: &Tz, today: NaiveDate) -> Result<Submission, ValidationError> {
        let title = self.title.value.trim().to_string();
        if title.is_empty() {
            return Err(self.reject(TITLE_FIELD, ValidationError::EmptyTitle));
        }
        let due: Option<DateTime<Utc>> = match parse_due_input(&self.due.value, tz, today) {
            Ok(due) => due,
            Err(()) => return Err(self.reject(DUE_FIELD, ValidationError::InvalidDue)),
        };
        let description = Some(self.description.value.trim().to_string()).filter(|d| !d.is_empty());
        let priority = self.priority.and_then(|i| Priority::CHOICES.get(i).copied());

        self.invalid_field = None;
        Ok(match self.mode {
            FormMode::Create => Submission::Create(NewTask {
                title,
                description,
                priority: priority.unwrap_or(Priority::Medium),
                due_date: due,
            }),
            FormMode::Edit(id) => Submission::Update(
                id,
                TaskPatch {
                    title,
                    description,
                    priority,
                    status: self.status.and_then(|i| Status::CHOICES.get(i).copied()),
                    due_date: due,
                },
            ),
        })
    }

    fn reject(&mut self, field: usize, error: ValidationError) -> ValidationError {
        self.invalid_field = Some(field);
        self.current_field = field;
        error
    }

    /// The status selector only exists while editing.
    fn field_visible(&self, field: usize) -> bool {
        field != STATUS_FIELD || matches!(self.mode, FormMode::Edit(_))
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        loop {
            self.current_field = (self.current_field + 1) % FIELD_COUNT;
            if self.field_visible(self.current_field) {
                break;
            }
        }
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        loop {
            self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
            if self.field_visible(self.current_field) {
                break;
            }
        }
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            DUE_FIELD => Some(&mut self.due),
            _ => None,
        }
    }

    /// Whether the focused field takes free text (as opposed to a selector).
    pub fn is_text_field(&self) -> bool {
        matches!(self.current_field, TITLE_FIELD | DESCRIPTION_FIELD | DUE_FIELD)
    }

    fn touched(&mut self) {
        if self.invalid_field == Some(self.current_field) {
            self.invalid_field = None;
        }
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        if let Some(input) = self.active_input() {
            input.handle_char(c);
            self.touched();
        }
    }

    /// Handle backspace input for the currently active field.
    pub fn handle_backspace(&mut self) {
        if let Some(input) = self.active_input() {
            input.handle_backspace();
            self.touched();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(input) = self.active_input() {
            input.handle_delete();
            self.touched();
        }
    }

    pub fn handle_home(&mut self) {
        if let Some(input) = self.active_input() {
            input.move_home();
        }
    }

    pub fn handle_end(&mut self) {
        if let Some(input) = self.active_input() {
            input.move_end();
        }
    }

    /// Handle left/right arrow keys for cursor movement or selector changes.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            PRIORITY_FIELD => self.priority = Some(step(self.priority, Priority::CHOICES.len(), right)),
            STATUS_FIELD => self.status = Some(step(self.status, Status::CHOICES.len(), right)),
            _ => {
                if let Some(input) = self.active_input() {
                    if right {
                        input.move_cursor_right();
                    } else {
                        input.move_cursor_left();
                    }
                }
            }
        }
    }

    pub fn selected_priority(&self) -> Option<Priority> {
        self.priority.and_then(|i| Priority::CHOICES.get(i).copied())
    }

    pub fn selected_status(&self) -> Option<Status> {
        self.status.and_then(|i| Status::CHOICES.get(i).copied())
    }
}

fn position<T: Choice>(choices: &[T], value: T) -> Option<usize> {
    choices.iter().position(|c| *c == value)
}

/// Cycle a selector index, starting from the first entry when unset.
fn step(current: Option<usize>, len: usize, forward: bool) -> usize {
    match current {
        None => 0,
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
    }
}
