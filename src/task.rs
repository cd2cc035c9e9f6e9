//! Task data structures exchanged with the TaskFlow service.
//!
//! `Task` mirrors the server's task record. The request payloads
//! (`NewTask`, `TaskPatch`) and the response wrappers (`Envelope`,
//! `TaskPage`, `CompletedTask`, `DeletedTask`) follow the service's JSON
//! shapes exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A task as held by the server and mirrored in the client snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /tasks/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /tasks/{id}`.
///
/// The server updates only the keys present. `description` and `due_date`
/// are always sent so that clearing them in the form clears them remotely;
/// `priority` and `status` are left out when the task held a value this
/// client does not know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPatch {
    pub title: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Success wrapper around every enveloped response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// `data` payload of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPage {
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    pub tasks: Vec<Task>,
}

/// Thin record returned by `PATCH /tasks/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletedTask {
    pub id: u64,
    pub is_completed: bool,
    pub status: Status,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// `data` payload of `DELETE /tasks/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeletedTask {
    pub deleted_id: u64,
}

/// Server timestamps arrive either with an offset or naive (SQLite); naive
/// values are UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => s.serialize_str(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_list_envelope_with_naive_and_offset_timestamps() {
        let body = r#"{
            "success": true,
            "message": "2 task(s) found.",
            "data": {
                "total": 2, "skip": 0, "limit": 100,
                "tasks": [
                    {"id": 2, "title": "B", "description": null, "status": "in_progress",
                     "priority": "high", "is_completed": false,
                     "due_date": "2025-12-31T23:59:00Z",
                     "created_at": "2025-01-02T10:00:00.123456",
                     "updated_at": "2025-01-02T10:00:00+00:00"},
                    {"id": 1, "title": "A", "description": "first", "status": "todo",
                     "priority": "medium", "is_completed": false, "due_date": null,
                     "created_at": "2025-01-01T09:00:00", "updated_at": "2025-01-01T09:00:00"}
                ]
            }
        }"#;
        let env: Envelope<TaskPage> = serde_json::from_str(body).unwrap();
        assert!(env.success);
        assert_eq!(env.data.total, 2);
        let b = &env.data.tasks[0];
        assert_eq!(b.status, Status::InProgress);
        assert_eq!(b.due_date, Some(Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap()));
        assert_eq!(env.data.tasks[1].created_at, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn new_task_omits_absent_optionals() {
        let body = NewTask {
            title: "A".into(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"title": "A", "priority": "medium"}));
    }

    #[test]
    fn patch_sends_null_to_clear_fields() {
        let body = TaskPatch {
            title: "A".into(),
            description: None,
            priority: None,
            status: Some(Status::Done),
            due_date: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["description"], serde_json::Value::Null);
        assert_eq!(json["due_date"], serde_json::Value::Null);
        assert_eq!(json["status"], "done");
        assert!(json.get("priority").is_none());
    }
}
