use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::user::User;

/// How many tasks the review queue returns.
pub const REVIEW_QUEUE_LIMIT: i64 = 2;

/// How many tasks the per-user in-progress list returns.
pub const IN_PROGRESS_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Queue,
    Review,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: &[Status] = &[
        Status::Queue,
        Status::Review,
        Status::Approved,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queue => "Queue",
            Status::Review => "Review",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "Queue" => Some(Status::Queue),
            "Review" => Some(Status::Review),
            "Approved" => Some(Status::Approved),
            "Rejected" => Some(Status::Rejected),
            _ => None,
        }
    }

    /// Whether the review workflow allows moving from `self` to `next`.
    ///
    /// `Queue -> Review -> {Approved, Rejected}` and `Rejected -> Queue`.
    /// Approved is terminal.
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Queue, Status::Review)
                | (Status::Review, Status::Approved)
                | (Status::Review, Status::Rejected)
                | (Status::Rejected, Status::Queue)
        )
    }

    pub fn transition_to(self, next: Status) -> Result<Status, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub revision: i32,
    pub due_date: String,
    pub submit_date: String,
    pub approve_date: String,
    pub rejected_date: String,
    pub reason: String,
    /// Original filename of the latest submission, empty if none.
    pub attachment: String,
    /// Location of that file inside the attachment store, empty if none.
    pub attachment_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its owning user loaded alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithUser {
    #[serde(flatten)]
    pub task: Task,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub due_date: String,
}

impl CreateTask {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("userId is required".into()));
        }
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("title is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub status: Option<Status>,
    pub revision: Option<i32>,
    pub submit_date: Option<String>,
    pub approve_date: Option<String>,
    pub rejected_date: Option<String>,
    pub reason: Option<String>,
    pub attachment: Option<String>,
    pub attachment_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<String>,
    pub status: Option<Status>,
    pub limit: Option<i64>,
}

/// Number of tasks in one status, as returned by the per-user statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Status,
    pub total: i64,
}

/// Parse a caller-supplied revision number.
///
/// Revisions are small non-negative counters; anything else is rejected.
pub fn parse_revision(raw: &str) -> Result<i32, CoreError> {
    let revision: i32 = raw
        .trim()
        .parse()
        .map_err(|e| CoreError::InvalidInput(format!("revision {raw:?}: {e}")))?;
    if revision < 0 {
        return Err(CoreError::InvalidInput(format!(
            "revision must not be negative, got {revision}"
        )));
    }
    Ok(revision)
}
