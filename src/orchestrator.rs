//! Command handling and request sequencing.
//!
//! The terminal shell turns key presses into [`Command`]s and hands them to
//! [`Orchestrator::handle`] together with the session [`Context`]. Anything
//! that talks to the service becomes a [`Job`] run by an [`Executor`] off the
//! UI thread; its [`Completion`] comes back over a channel and is applied by
//! [`Orchestrator::pump`] between frames.
//!
//! A successful mutation resets the controller that issued it, schedules a
//! full reload and only then reports success. A failure reports the error and
//! leaves the snapshot, form and filters as they were.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tracing::{debug, warn};

use crate::api::{ListQuery, TaskService};
use crate::error::{NotFoundLocal, RequestError};
use crate::fields::{Filter, Priority, Status};
use crate::render::{render_board, BoardView};
use crate::store::TaskStore;
use crate::task::{CompletedTask, DeletedTask, NewTask, Task, TaskPage, TaskPatch};
use crate::tui::modal::DeleteGate;
use crate::tui::notify::{NoticeKind, Notifications};
use crate::tui::task_form::{FormMode, Submission, TaskForm};

/// Progress of the last form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Saving,
    /// `form_closed` is false when the form had moved on to another task
    /// before the save landed, so the draft there is still open.
    Saved { form_closed: bool },
    Failed,
}

/// Everything the client knows during a session.
#[derive(Debug)]
pub struct Context {
    pub store: TaskStore,
    pub form: TaskForm,
    pub gate: DeleteGate,
    pub notices: Notifications,
    /// Task shown in the details overlay, as last fetched from the server.
    pub detail: Option<Task>,
    /// Set by the orchestrator; the shell acknowledges by putting it back to `Idle`.
    pub submit: SubmitState,
    in_flight: usize,
    loading: usize,
}

impl Context {
    pub fn new(store: TaskStore, notice_lifetime: Duration) -> Self {
        Self {
            store,
            form: TaskForm::new(),
            gate: DeleteGate::default(),
            notices: Notifications::new(notice_lifetime),
            detail: None,
            submit: SubmitState::Idle,
            in_flight: 0,
            loading: 0,
        }
    }

    /// True while any request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// True while an initial or manual list load is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.loading > 0
    }

    /// The board as it should be drawn at `now`.
    pub fn view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> BoardView
    where
        Tz::Offset: std::fmt::Display,
    {
        render_board(&self.store, self.is_refreshing(), now)
    }
}

/// User intents the shell can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Initial load or manual refresh; clears the list until it lands.
    Refresh,
    SetStatusFilter(Filter<Status>),
    SetPriorityFilter(Filter<Priority>),
    BeginEdit(u64),
    CancelEdit,
    Submit,
    Complete(u64),
    RequestDelete(u64),
    ConfirmDelete,
    CancelDelete,
    ShowDetails(u64),
    CloseDetails,
    CheckHealth,
}

/// Message to post once a reload lands.
pub type FollowUp = (String, NoticeKind);

/// A single request to run against the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Load {
        query: ListQuery,
        /// Clears the list while in flight.
        refresh: bool,
        then: Option<FollowUp>,
    },
    Fetch(u64),
    Create(NewTask),
    Update(u64, TaskPatch),
    Complete(u64),
    Delete(u64),
    Health,
}

/// Outcome of a [`Job`], carried back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        result: Result<TaskPage, RequestError>,
        refresh: bool,
        then: Option<FollowUp>,
    },
    Fetched(u64, Result<Task, RequestError>),
    Created(Result<Task, RequestError>),
    Updated(u64, Result<Task, RequestError>),
    Completed(u64, Result<CompletedTask, RequestError>),
    Deleted(u64, Result<DeletedTask, RequestError>),
    Health(Result<(), RequestError>),
}

/// Perform `job` against `service`, blocking until it finishes.
pub fn run_job(service: &dyn TaskService, job: Job) -> Completion {
    match job {
        Job::Load { query, refresh, then } => Completion::Loaded {
            result: service.list(&query),
            refresh,
            then,
        },
        Job::Fetch(id) => Completion::Fetched(id, service.get(id)),
        Job::Create(new) => Completion::Created(service.create(&new)),
        Job::Update(id, patch) => Completion::Updated(id, service.update(id, &patch)),
        Job::Complete(id) => Completion::Completed(id, service.complete(id)),
        Job::Delete(id) => Completion::Deleted(id, service.delete(id)),
        Job::Health => Completion::Health(service.health()),
    }
}

/// Runs jobs somewhere and posts each completion to `reply`.
pub trait Executor {
    fn spawn(&self, job: Job, reply: Sender<Completion>);
}

/// One worker thread per request.
pub struct ThreadExecutor {
    service: Arc<dyn TaskService>,
}

impl ThreadExecutor {
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self { service }
    }
}

impl Executor for ThreadExecutor {
    fn spawn(&self, job: Job, reply: Sender<Completion>) {
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let completion = run_job(service.as_ref(), job);
            // The receiver is gone once the UI has quit; the result is abandoned.
            let _ = reply.send(completion);
        });
    }
}

/// Dispatches commands and applies completions for one session.
pub struct Orchestrator<E: Executor> {
    executor: E,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl<E: Executor> Orchestrator<E> {
    pub fn new(executor: E) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { executor, tx, rx }
    }

    #[cfg(test)]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Act on one user command.
    pub fn handle(&self, ctx: &mut Context, command: Command) {
        debug!(?command, "handling command");
        match command {
            Command::Refresh => {
                let query = ctx.store.list_query();
                self.dispatch(ctx, Job::Load { query, refresh: true, then: None });
            }
            Command::SetStatusFilter(filter) => ctx.store.set_status_filter(filter),
            Command::SetPriorityFilter(filter) => ctx.store.set_priority_filter(filter),
            Command::BeginEdit(id) => match ctx.store.get(id) {
                Some(task) => {
                    let task = task.clone();
                    ctx.form.begin_edit(&task, &Local);
                }
                None => not_found_locally(ctx, id),
            },
            Command::CancelEdit => {
                ctx.form.cancel_edit();
            }
            Command::Submit => {
                if ctx.submit == SubmitState::Saving {
                    debug!("submit ignored while saving");
                    return;
                }
                let today = Local::now().date_naive();
                match ctx.form.submit(&Local, today) {
                    Ok(Submission::Create(new)) => {
                        ctx.submit = SubmitState::Saving;
                        self.dispatch(ctx, Job::Create(new));
                    }
                    Ok(Submission::Update(id, patch)) => {
                        ctx.submit = SubmitState::Saving;
                        self.dispatch(ctx, Job::Update(id, patch));
                    }
                    // Flagged on the form itself; nothing is sent.
                    Err(e) => debug!(error = %e, "form rejected"),
                }
            }
            Command::Complete(id) => {
                if ctx.store.get(id).is_some() {
                    self.dispatch(ctx, Job::Complete(id));
                } else {
                    not_found_locally(ctx, id);
                }
            }
            Command::RequestDelete(id) => {
                if ctx.store.get(id).is_some() {
                    ctx.gate.request(id);
                } else {
                    not_found_locally(ctx, id);
                }
            }
            Command::ConfirmDelete => {
                if let Some(id) = ctx.gate.confirm() {
                    self.dispatch(ctx, Job::Delete(id));
                }
            }
            Command::CancelDelete => {
                ctx.gate.cancel();
            }
            Command::ShowDetails(id) => {
                if ctx.store.get(id).is_some() {
                    self.dispatch(ctx, Job::Fetch(id));
                } else {
                    not_found_locally(ctx, id);
                }
            }
            Command::CloseDetails => ctx.detail = None,
            Command::CheckHealth => self.dispatch(ctx, Job::Health),
        }
    }

    /// Apply every completion that has arrived. Returns how many were applied.
    pub fn pump(&self, ctx: &mut Context) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.settle(ctx, completion);
            applied += 1;
        }
        applied
    }

    fn dispatch(&self, ctx: &mut Context, job: Job) {
        ctx.in_flight += 1;
        if let Job::Load { refresh: true, .. } = job {
            ctx.loading += 1;
        }
        debug!(?job, in_flight = ctx.in_flight, "dispatching request");
        self.executor.spawn(job, self.tx.clone());
    }

    /// Schedule a reload that posts `message` once it lands.
    fn reload_then(&self, ctx: &mut Context, message: &str) {
        let query = ctx.store.list_query();
        self.dispatch(
            ctx,
            Job::Load {
                query,
                refresh: false,
                then: Some((message.to_string(), NoticeKind::Success)),
            },
        );
    }

    fn settle(&self, ctx: &mut Context, completion: Completion) {
        ctx.in_flight = ctx.in_flight.saturating_sub(1);
        match completion {
            Completion::Loaded { result, refresh, then } => {
                if refresh {
                    ctx.loading = ctx.loading.saturating_sub(1);
                }
                match result {
                    Ok(page) => ctx.store.install(page),
                    Err(e) => fail(ctx, "Failed to load tasks", &e),
                }
                if let Some((message, kind)) = then {
                    ctx.notices.notify(message, kind);
                }
            }
            Completion::Fetched(id, result) => match result {
                Ok(task) => ctx.detail = Some(task),
                Err(e) if e.is_not_found() => {
                    warn!(task_id = id, "task gone from the server");
                    ctx.notices.notify(
                        format!("Task #{id} no longer exists; press 'r' to reload"),
                        NoticeKind::Error,
                    );
                }
                Err(e) => fail(ctx, &format!("Failed to load task #{id}"), &e),
            },
            Completion::Created(result) => match result {
                Ok(task) => {
                    debug!(task_id = task.id, "task created");
                    let form_closed = ctx.form.mode() == FormMode::Create;
                    if form_closed {
                        ctx.form.reset();
                    }
                    ctx.submit = SubmitState::Saved { form_closed };
                    self.reload_then(ctx, "Task created");
                }
                Err(e) => {
                    ctx.submit = SubmitState::Failed;
                    fail(ctx, "Failed to create task", &e);
                }
            },
            Completion::Updated(id, result) => match result {
                Ok(_) => {
                    let form_closed = ctx.form.mode() == FormMode::Edit(id);
                    if form_closed {
                        ctx.form.reset();
                    }
                    ctx.submit = SubmitState::Saved { form_closed };
                    self.reload_then(ctx, "Task updated");
                }
                Err(e) => {
                    ctx.submit = SubmitState::Failed;
                    fail(ctx, "Failed to update task", &e);
                }
            },
            Completion::Completed(id, result) => match result {
                Ok(done) => {
                    debug!(task_id = id, status = ?done.status, "task completed");
                    self.reload_then(ctx, "Task marked as completed");
                }
                Err(e) => fail(ctx, "Failed to complete task", &e),
            },
            Completion::Deleted(id, result) => {
                ctx.gate.finish(id);
                match result {
                    Ok(deleted) => {
                        debug!(task_id = deleted.deleted_id, "task deleted");
                        if ctx.form.mode() == FormMode::Edit(id) {
                            ctx.form.reset();
                        }
                        if ctx.detail.as_ref().is_some_and(|t| t.id == id) {
                            ctx.detail = None;
                        }
                        self.reload_then(ctx, "Task deleted");
                    }
                    Err(e) => fail(ctx, "Failed to delete task", &e),
                }
            }
            Completion::Health(result) => match result {
                Ok(()) => ctx.notices.notify("Connected to TaskFlow service", NoticeKind::Info),
                Err(e) => fail(ctx, "TaskFlow service unreachable", &e),
            },
        }
    }
}

fn fail(ctx: &mut Context, action: &str, error: &RequestError) {
    warn!(status = ?error.status, error = %error, "{action}");
    ctx.notices.notify(format!("{action}: {error}"), NoticeKind::Error);
}

fn not_found_locally(ctx: &mut Context, id: u64) {
    let error = NotFoundLocal { id };
    warn!(task_id = id, "task missing from snapshot");
    ctx.notices.notify(error.to_string(), NoticeKind::Error);
}
