//! Delete confirmation gate.
//!
//! Deleting a task takes two steps: `request` arms the gate for one id, and
//! `confirm` hands that same id back exactly once. Whatever the list shows
//! by the time the user confirms, the id acted on is the one captured when
//! the gate opened.
//!
//! After confirming, the gate stays open in `Deleting` until the request
//! settles, then `finish` closes it whether the delete worked or not.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteGate {
    #[default]
    Idle,
    Confirming(u64),
    /// Confirmed; the delete request for this id is in flight.
    Deleting(u64),
}

impl DeleteGate {
    /// Open the confirmation for `id`.
    ///
    /// Ignored while a confirmed delete is still in flight.
    pub fn request(&mut self, id: u64) -> bool {
        if let DeleteGate::Deleting(_) = self {
            return false;
        }
        debug!(task_id = id, "delete confirmation opened");
        *self = DeleteGate::Confirming(id);
        true
    }

    /// Close without deleting. Returns the id that was awaiting confirmation, if any.
    pub fn cancel(&mut self) -> Option<u64> {
        let pending = match *self {
            DeleteGate::Confirming(id) => Some(id),
            _ => None,
        };
        if let Some(id) = pending {
            debug!(task_id = id, "delete confirmation cancelled");
        }
        *self = DeleteGate::Idle;
        pending
    }

    /// Release the captured id for deletion. Only the first confirm counts.
    pub fn confirm(&mut self) -> Option<u64> {
        match *self {
            DeleteGate::Confirming(id) => {
                *self = DeleteGate::Deleting(id);
                Some(id)
            }
            _ => None,
        }
    }

    /// The delete for `id` settled; close the gate if it is still waiting on it.
    pub fn finish(&mut self, id: u64) {
        if *self == DeleteGate::Deleting(id) {
            *self = DeleteGate::Idle;
        }
    }

    /// The id the open gate refers to.
    pub fn target(&self) -> Option<u64> {
        match *self {
            DeleteGate::Idle => None,
            DeleteGate::Confirming(id) | DeleteGate::Deleting(id) => Some(id),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DeleteGate::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_releases_captured_id_once() {
        let mut gate = DeleteGate::default();
        gate.request(5);
        assert!(gate.is_open());
        assert_eq!(gate.confirm(), Some(5));
        assert_eq!(gate, DeleteGate::Deleting(5));
        assert_eq!(gate.confirm(), None);
        gate.finish(5);
        assert_eq!(gate, DeleteGate::Idle);
    }

    #[test]
    fn cancel_returns_to_idle_without_release() {
        let mut gate = DeleteGate::default();
        gate.request(5);
        assert_eq!(gate.cancel(), Some(5));
        assert_eq!(gate, DeleteGate::Idle);
        assert_eq!(gate.confirm(), None);
    }

    #[test]
    fn finish_for_another_id_keeps_gate() {
        let mut gate = DeleteGate::default();
        gate.request(5);
        gate.confirm();
        gate.finish(6);
        assert_eq!(gate.target(), Some(5));
    }

    #[test]
    fn new_request_waits_for_inflight_delete() {
        let mut gate = DeleteGate::default();
        gate.request(5);
        gate.confirm();
        assert!(!gate.request(6));
        assert_eq!(gate.target(), Some(5));
    }

    #[test]
    fn confirm_without_request_does_nothing() {
        let mut gate = DeleteGate::default();
        assert_eq!(gate.confirm(), None);
        assert_eq!(gate.cancel(), None);
    }
}
