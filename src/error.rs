//! Error types surfaced to the user.
//!
//! None of these end the session: the orchestrator turns each of them into a
//! notification (or field-level feedback, for validation).

use thiserror::Error;

/// A local form problem found before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty after trimming surrounding whitespace.
    #[error("Title is required")]
    EmptyTitle,
    /// Due date text could not be coerced to a timestamp.
    #[error("Due date not understood (try YYYY-MM-DD HH:MM)")]
    InvalidDue,
}

/// A failed call to the task service: transport, HTTP status or body decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
    pub message: String,
}

impl RequestError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// A task id the current snapshot does not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Task #{id} is not in the current list; try refreshing")]
pub struct NotFoundLocal {
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_as_notices() {
        assert_eq!(ValidationError::EmptyTitle.to_string(), "Title is required");
        assert_eq!(RequestError::http(500, "boom").to_string(), "boom");
        assert_eq!(
            NotFoundLocal { id: 7 }.to_string(),
            "Task #7 is not in the current list; try refreshing"
        );
        assert!(RequestError::http(404, "gone").is_not_found());
        assert!(!RequestError::transport("refused").is_not_found());
    }
}
