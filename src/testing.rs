//! In-memory stand-in for the TaskFlow service used by unit tests.

use std::cell::RefCell;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use crate::api::{ListQuery, TaskService};
use crate::error::RequestError;
use crate::orchestrator::{run_job, Completion, Executor, Job};
use crate::fields::{Priority, Status};
use crate::task::{CompletedTask, DeletedTask, NewTask, Task, TaskPage, TaskPatch};

/// A task with fixed timestamps.
pub fn task(id: u64, title: &str, status: Status, priority: Priority) -> Task {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    Task {
        id,
        title: title.to_string(),
        description: None,
        status,
        priority,
        is_completed: status == Status::Done,
        due_date: None,
        created_at: at,
        updated_at: at,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ListQuery),
    Get(u64),
    Create(NewTask),
    Update(u64, TaskPatch),
    Complete(u64),
    Delete(u64),
    Health,
}

#[derive(Default)]
struct FakeState {
    tasks: Vec<Task>,
    next_id: u64,
    calls: Vec<Call>,
    fail_next: Option<String>,
}

/// Behaves like the service: newest first, server-side filters, 404 for unknown ids.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<FakeState>,
}

impl FakeService {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(FakeState { tasks, next_id, ..FakeState::default() }),
        }
    }

    /// Make the next call fail with a 500 carrying `message`.
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_list_query(&self) -> Option<ListQuery> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::List(q) => Some(q),
            _ => None,
        })
    }

    fn begin(&self, call: Call) -> Result<std::sync::MutexGuard<'_, FakeState>, RequestError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(message) => Err(RequestError::http(500, message)),
            None => Ok(state),
        }
    }
}

fn not_found() -> RequestError {
    RequestError::http(404, "Task not found.")
}

impl TaskService for FakeService {
    fn list(&self, query: &ListQuery) -> Result<TaskPage, RequestError> {
        let state = self.begin(Call::List(*query))?;
        let matching: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| query.status.matches(t.status) && query.priority.matches(t.priority))
            .cloned()
            .collect();
        Ok(TaskPage {
            total: matching.len() as u64,
            skip: query.skip,
            limit: query.limit,
            tasks: matching
                .into_iter()
                .skip(query.skip as usize)
                .take(query.limit as usize)
                .collect(),
        })
    }

    fn get(&self, id: u64) -> Result<Task, RequestError> {
        let state = self.begin(Call::Get(id))?;
        state.tasks.iter().find(|t| t.id == id).cloned().ok_or_else(not_found)
    }

    fn create(&self, new: &NewTask) -> Result<Task, RequestError> {
        let mut state = self.begin(Call::Create(new.clone()))?;
        let id = state.next_id.max(1);
        state.next_id = id + 1;
        let mut created = task(id, &new.title, Status::Todo, new.priority);
        created.description = new.description.clone();
        created.due_date = new.due_date;
        state.tasks.insert(0, created.clone());
        Ok(created)
    }

    fn update(&self, id: u64, patch: &TaskPatch) -> Result<Task, RequestError> {
        let mut state = self.begin(Call::Update(id, patch.clone()))?;
        let t = state.tasks.iter_mut().find(|t| t.id == id).ok_or_else(not_found)?;
        t.title = patch.title.clone();
        t.description = patch.description.clone();
        if let Some(priority) = patch.priority {
            t.priority = priority;
        }
        if let Some(status) = patch.status {
            t.status = status;
        }
        t.due_date = patch.due_date;
        Ok(t.clone())
    }

    fn complete(&self, id: u64) -> Result<CompletedTask, RequestError> {
        let mut state = self.begin(Call::Complete(id))?;
        let t = state.tasks.iter_mut().find(|t| t.id == id).ok_or_else(not_found)?;
        t.is_completed = true;
        t.status = Status::Done;
        Ok(CompletedTask {
            id,
            is_completed: true,
            status: Status::Done,
            updated_at: t.updated_at,
        })
    }

    fn delete(&self, id: u64) -> Result<DeletedTask, RequestError> {
        let mut state = self.begin(Call::Delete(id))?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(not_found());
        }
        Ok(DeletedTask { deleted_id: id })
    }

    fn health(&self) -> Result<(), RequestError> {
        self.begin(Call::Health).map(|_| ())
    }
}

/// Runs each job on the calling thread as soon as it is spawned.
pub struct InlineExecutor(pub Arc<FakeService>);

impl Executor for InlineExecutor {
    fn spawn(&self, job: Job, reply: Sender<Completion>) {
        reply.send(run_job(self.0.as_ref(), job)).unwrap();
    }
}

/// Holds jobs until the test runs them, in any order.
pub struct ManualExecutor {
    service: Arc<FakeService>,
    queued: RefCell<Vec<(Job, Sender<Completion>)>>,
}

impl ManualExecutor {
    pub fn new(service: Arc<FakeService>) -> Self {
        Self { service, queued: RefCell::new(Vec::new()) }
    }

    pub fn run(&self, index: usize) {
        let (job, reply) = self.queued.borrow_mut().remove(index);
        reply.send(run_job(self.service.as_ref(), job)).unwrap();
    }

    pub fn run_all(&self) {
        while self.pending() > 0 {
            self.run(0);
        }
    }

    pub fn pending(&self) -> usize {
        self.queued.borrow().len()
    }
}

impl Executor for ManualExecutor {
    fn spawn(&self, job: Job, reply: Sender<Completion>) {
        self.queued.borrow_mut().push((job, reply));
    }
}
