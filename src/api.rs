//! Typed client for the TaskFlow REST service.
//!
//! `TaskService` is the seam the rest of the client talks to; `ApiClient` is
//! the HTTP implementation. Every operation performs exactly one request, with
//! no retry and no timeout beyond the transport default.

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::fields::{Filter, Priority, Status};
use crate::task::{CompletedTask, DeletedTask, Envelope, NewTask, Task, TaskPage, TaskPatch};

/// Largest page the service accepts.
pub const MAX_PAGE_SIZE: u64 = 500;

/// Parameters of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Filter<Status>,
    pub priority: Filter<Priority>,
    pub skip: u64,
    pub limit: u64,
}

impl ListQuery {
    /// Query-string pairs in request order. `all` filters are left out entirely.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(status) = self.status.query_value() {
            pairs.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority.query_value() {
            pairs.push(("priority", priority.to_string()));
        }
        pairs.push(("skip", self.skip.to_string()));
        pairs.push(("limit", self.limit.clamp(1, MAX_PAGE_SIZE).to_string()));
        pairs
    }
}

/// The remote task store, one method per server action.
pub trait TaskService: Send + Sync {
    fn list(&self, query: &ListQuery) -> Result<TaskPage, RequestError>;
    fn get(&self, id: u64) -> Result<Task, RequestError>;
    fn create(&self, task: &NewTask) -> Result<Task, RequestError>;
    fn update(&self, id: u64, patch: &TaskPatch) -> Result<Task, RequestError>;
    fn complete(&self, id: u64) -> Result<CompletedTask, RequestError>;
    fn delete(&self, id: u64) -> Result<DeletedTask, RequestError>;
    fn health(&self) -> Result<(), RequestError>;
}

/// HTTP implementation of `TaskService`.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        let http = Client::builder()
            .user_agent(concat!("taskflow-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RequestError::transport(format!("failed building HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode its 2xx body as `T`.
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RequestError> {
        let response = request.send().map_err(|e| {
            warn!(error = %e, "request failed before a response arrived");
            RequestError::transport(format!("Network error: {e}"))
        })?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RequestError::http(status.as_u16(), format!("Failed reading response: {e}")))?;

        if !status.is_success() {
            let err = error_from_response(status.as_u16(), status.canonical_reason(), &body);
            warn!(status = status.as_u16(), message = %err, "service returned an error");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "malformed response body");
            RequestError::http(status.as_u16(), format!("Malformed response from server: {e}"))
        })
    }

    fn send_enveloped<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RequestError> {
        let envelope: Envelope<T> = self.send(request)?;
        debug!(message = %envelope.message, "service replied");
        Ok(envelope.data)
    }
}

impl TaskService for ApiClient {
    fn list(&self, query: &ListQuery) -> Result<TaskPage, RequestError> {
        let pairs = query.pairs();
        debug!(?pairs, "listing tasks");
        self.send_enveloped(self.http.get(self.url("/tasks/")).query(&pairs))
    }

    fn get(&self, id: u64) -> Result<Task, RequestError> {
        self.send_enveloped(self.http.get(self.url(&format!("/tasks/{id}"))))
    }

    fn create(&self, task: &NewTask) -> Result<Task, RequestError> {
        self.send_enveloped(self.http.post(self.url("/tasks/")).json(task))
    }

    fn update(&self, id: u64, patch: &TaskPatch) -> Result<Task, RequestError> {
        self.send_enveloped(self.http.put(self.url(&format!("/tasks/{id}"))).json(patch))
    }

    fn complete(&self, id: u64) -> Result<CompletedTask, RequestError> {
        self.send_enveloped(self.http.patch(self.url(&format!("/tasks/{id}/complete"))))
    }

    fn delete(&self, id: u64) -> Result<DeletedTask, RequestError> {
        self.send_enveloped(self.http.delete(self.url(&format!("/tasks/{id}"))))
    }

    fn health(&self) -> Result<(), RequestError> {
        let _: Value = self.send(self.http.get(self.url("/health")))?;
        Ok(())
    }
}

/// Build the error for a non-2xx response.
///
/// Prefers the service's `detail` field; FastAPI validation failures carry a
/// list of `{msg}` objects there instead of a string.
pub fn error_from_response(status: u16, reason: Option<&str>, body: &str) -> RequestError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .and_then(|detail| match detail {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Array(items) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        });

    match detail {
        Some(message) => RequestError::http(status, message),
        None => RequestError::http(status, format!("HTTP {}: {}", status, reason.unwrap_or(""))),
    }
}
