use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use tusk_core::task::{CreateTask, Status, StatusCount, Task, TaskWithUser};
use tusk_core::user::{Credentials, EmployeeSummary, RegisterUser, User};
use tusk_core::CoreError;
use tusk_db::DbError;
use tusk_store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => ServiceError::NotFound(format!("attachment {key}")),
            StoreError::InvalidKey(key) => {
                ServiceError::InvalidInput(format!("invalid attachment path: {key}"))
            }
            StoreError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        match e {
            e @ CoreError::IllegalTransition { .. } => {
                ServiceError::InvalidTransition(e.to_string())
            }
            CoreError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
        }
    }
}

/// A file received with a submission.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// Account operations.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create an `Employee` account. The supplied password is ignored; new
    /// accounts always start with [`crate::DEFAULT_PASSWORD`].
    async fn register(&self, input: &RegisterUser) -> Result<User, ServiceError>;
    async fn login(&self, credentials: &Credentials) -> Result<User, ServiceError>;
    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, ServiceError>;
    /// Deleting an unknown id succeeds.
    async fn delete_user(&self, id: &str) -> Result<(), ServiceError>;
    /// Create the `Admin` owner account if missing. Returns whether it was
    /// created.
    async fn bootstrap_owner(&self) -> Result<bool, ServiceError>;
}

/// Task workflow: `Queue -> Review -> Approved | Rejected`, `Rejected -> Queue`.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError>;
    async fn get_task(&self, id: &str) -> Result<TaskWithUser, ServiceError>;
    async fn delete_task(&self, id: &str) -> Result<(), ServiceError>;

    // -- Transitions --
    async fn submit_task(
        &self,
        id: &str,
        submit_date: &str,
        upload: Upload,
    ) -> Result<Task, ServiceError>;
    async fn reject_task(
        &self,
        id: &str,
        reason: &str,
        rejected_date: &str,
    ) -> Result<Task, ServiceError>;
    async fn fix_task(&self, id: &str, revision: &str) -> Result<Task, ServiceError>;
    async fn approve_task(&self, id: &str, approve_date: &str) -> Result<Task, ServiceError>;

    // -- Queries --
    async fn needs_review(&self) -> Result<Vec<TaskWithUser>, ServiceError>;
    async fn in_progress(&self, user_id: &str) -> Result<Vec<Task>, ServiceError>;
    async fn statistics(&self, user_id: &str) -> Result<Vec<StatusCount>, ServiceError>;
    async fn tasks_by_user_and_status(
        &self,
        user_id: &str,
        status: Status,
    ) -> Result<Vec<Task>, ServiceError>;

    // -- Attachments --
    async fn read_attachment(&self, path: &str) -> Result<Bytes, ServiceError>;
}
