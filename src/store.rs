//! The client-side snapshot of the server's tasks.
//!
//! `TaskStore` holds the last list response as a whole and the two active
//! filters. The snapshot is only ever replaced, never edited in place, so a
//! reader sees either the previous list or the new one.

use tracing::debug;

use crate::api::{ListQuery, TaskService};
use crate::error::RequestError;
use crate::fields::{Filter, Priority, Status};
use crate::task::{Task, TaskPage};

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    total: u64,
    status_filter: Filter<Status>,
    priority_filter: Filter<Priority>,
    page_size: u64,
}

impl TaskStore {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Fetch the list for the current filters and install it.
    ///
    /// On failure the current snapshot is kept untouched.
    pub fn load_snapshot(&mut self, service: &dyn TaskService) -> Result<(), RequestError> {
        let page = service.list(&self.list_query())?;
        self.install(page);
        Ok(())
    }

    /// The list request matching the active filters.
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            status: self.status_filter,
            priority: self.priority_filter,
            skip: 0,
            limit: self.page_size,
        }
    }

    /// Replace the snapshot wholesale with a server response.
    pub fn install(&mut self, page: TaskPage) {
        debug!(count = page.tasks.len(), total = page.total, "installing task snapshot");
        self.tasks = page.tasks;
        self.total = page.total;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Server-side count for the last list request, which may exceed one page.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn status_filter(&self) -> Filter<Status> {
        self.status_filter
    }

    pub fn priority_filter(&self) -> Filter<Priority> {
        self.priority_filter
    }

    /// Change the status filter. The caller re-derives the view; nothing is fetched.
    pub fn set_status_filter(&mut self, filter: Filter<Status>) {
        self.status_filter = filter;
    }

    /// Change the priority filter. The caller re-derives the view; nothing is fetched.
    pub fn set_priority_filter(&mut self, filter: Filter<Priority>) {
        self.priority_filter = filter;
    }

    /// Tasks matching both active filters, in snapshot order.
    pub fn derive_view(&self) -> Vec<&Task> {
        filter_tasks(&self.tasks, self.status_filter, self.priority_filter)
    }
}

/// The subsequence of `tasks` passing both filters.
pub fn filter_tasks(
    tasks: &[Task],
    status: Filter<Status>,
    priority: Filter<Priority>,
) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| status.matches(t.status) && priority.matches(t.priority))
        .collect()
}
