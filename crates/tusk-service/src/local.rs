use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use tusk_core::task::{
    parse_revision, CreateTask, Status, StatusCount, Task, TaskFilter, TaskWithUser, UpdateTask,
    IN_PROGRESS_LIMIT, REVIEW_QUEUE_LIMIT,
};
use tusk_core::user::{Credentials, EmployeeSummary, NewUser, RegisterUser, Role, User};
use tusk_db::{Database, DbError};
use tusk_store::{attachment_key, new_attachment_path, ObjectStore};

use crate::password::{hash_password, verify_password};
use crate::{ServiceError, TaskService, Upload, UserService};
use crate::{DEFAULT_BCRYPT_COST, DEFAULT_PASSWORD, OWNER_EMAIL, OWNER_NAME};

const DUPLICATE_EMAIL: &str = "Email already exist";
const BAD_CREDENTIALS: &str = "Email or Password is Wrong";

/// In-process implementation over a database handle and an attachment store.
pub struct LocalService {
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    bcrypt_cost: u32,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Load a task and check that it may move to `next`.
    async fn begin_transition(&self, id: &str, next: Status) -> Result<Task, ServiceError> {
        let task = self.db.get_task(id).await?;
        task.status.transition_to(next)?;
        Ok(task)
    }

    async fn apply_transition(
        &self,
        task: &Task,
        update: UpdateTask,
    ) -> Result<Task, ServiceError> {
        let updated = self.db.update_task(&task.id, &update).await?;
        tracing::info!(
            task_id = %task.id,
            from = %task.status,
            to = %updated.status,
            "task transition"
        );
        Ok(updated)
    }

    /// Best-effort removal of a stored attachment.
    async fn discard_attachment(&self, attachment_path: &str) {
        if attachment_path.is_empty() {
            return;
        }
        let key = attachment_key(attachment_path);
        match self.store.delete(&key).await {
            Ok(()) => tracing::debug!(%key, "deleted attachment"),
            Err(e) => tracing::warn!(%key, "failed to delete attachment: {e}"),
        }
    }
}

#[async_trait]
impl UserService for LocalService {
    async fn register(&self, input: &RegisterUser) -> Result<User, ServiceError> {
        let email = input.email.as_str();
        if email.trim().is_empty() {
            return Err(ServiceError::InvalidInput("email is required".into()));
        }
        if self.db.find_user_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.into()));
        }
        if !input.password.is_empty() {
            tracing::debug!("ignoring supplied password for new account");
        }

        let password_hash = hash_password(DEFAULT_PASSWORD.to_string(), self.bcrypt_cost).await?;
        let user = self
            .db
            .create_user(&NewUser {
                role: Role::Employee,
                name: input.name.clone(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => ServiceError::Conflict(DUPLICATE_EMAIL.into()),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "registered employee");
        Ok(user)
    }

    async fn login(&self, credentials: &Credentials) -> Result<User, ServiceError> {
        let record = self
            .db
            .find_user_by_email(&credentials.email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(BAD_CREDENTIALS.into()))?;

        if !verify_password(credentials.password.clone(), record.password_hash).await? {
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        Ok(record.user)
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, ServiceError> {
        Ok(self.db.list_employees().await?)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        if self.db.delete_user(id).await? {
            tracing::info!(user_id = %id, "deleted user");
        }
        Ok(())
    }

    async fn bootstrap_owner(&self) -> Result<bool, ServiceError> {
        if self.db.find_user_by_email(OWNER_EMAIL).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(DEFAULT_PASSWORD.to_string(), self.bcrypt_cost).await?;
        let created = self
            .db
            .create_user(&NewUser {
                role: Role::Admin,
                name: OWNER_NAME.into(),
                email: OWNER_EMAIL.into(),
                password_hash,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "created owner account");
                Ok(true)
            }
            // Another process got there first.
            Err(DbError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TaskService for LocalService {
    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        input.validate()?;
        match self.db.get_user(&input.user_id).await {
            Ok(_) => {}
            Err(DbError::NotFound(_)) => {
                return Err(ServiceError::InvalidInput(format!(
                    "unknown user {}",
                    input.user_id
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let task = self.db.create_task(input).await?;
        tracing::info!(task_id = %task.id, user_id = %task.user_id, "created task");
        Ok(task)
    }

    async fn get_task(&self, id: &str) -> Result<TaskWithUser, ServiceError> {
        Ok(self.db.get_task_with_user(id).await?)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ServiceError> {
        let task = self.db.get_task(id).await?;
        self.db.delete_task(id).await?;
        tracing::info!(task_id = %id, "deleted task");
        self.discard_attachment(&task.attachment_path).await;
        Ok(())
    }

    async fn submit_task(
        &self,
        id: &str,
        submit_date: &str,
        upload: Upload,
    ) -> Result<Task, ServiceError> {
        let task = self.begin_transition(id, Status::Review).await?;

        let attachment_path = new_attachment_path(&upload.filename);
        let key = attachment_key(&attachment_path);
        let size = upload.data.len();
        self.store.put(&key, upload.data).await?;
        tracing::info!(task_id = %id, %key, size, "stored attachment");

        let update = UpdateTask {
            status: Some(Status::Review),
            submit_date: Some(submit_date.to_string()),
            attachment: Some(upload.filename),
            attachment_path: Some(attachment_path.clone()),
            ..Default::default()
        };
        let updated = match self.apply_transition(&task, update).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_attachment(&attachment_path).await;
                return Err(e);
            }
        };

        self.discard_attachment(&task.attachment_path).await;
        Ok(updated)
    }

    async fn reject_task(
        &self,
        id: &str,
        reason: &str,
        rejected_date: &str,
    ) -> Result<Task, ServiceError> {
        let task = self.begin_transition(id, Status::Rejected).await?;
        let update = UpdateTask {
            status: Some(Status::Rejected),
            reason: Some(reason.to_string()),
            rejected_date: Some(rejected_date.to_string()),
            ..Default::default()
        };
        self.apply_transition(&task, update).await
    }

    async fn fix_task(&self, id: &str, revision: &str) -> Result<Task, ServiceError> {
        let revision = parse_revision(revision)?;
        let task = self.begin_transition(id, Status::Queue).await?;
        let update = UpdateTask {
            status: Some(Status::Queue),
            revision: Some(revision),
            ..Default::default()
        };
        self.apply_transition(&task, update).await
    }

    async fn approve_task(&self, id: &str, approve_date: &str) -> Result<Task, ServiceError> {
        let task = self.begin_transition(id, Status::Approved).await?;
        let update = UpdateTask {
            status: Some(Status::Approved),
            approve_date: Some(approve_date.to_string()),
            ..Default::default()
        };
        self.apply_transition(&task, update).await
    }

    async fn needs_review(&self) -> Result<Vec<TaskWithUser>, ServiceError> {
        Ok(self.db.list_review_queue(REVIEW_QUEUE_LIMIT).await?)
    }

    async fn in_progress(&self, user_id: &str) -> Result<Vec<Task>, ServiceError> {
        Ok(self.db.list_in_progress(user_id, IN_PROGRESS_LIMIT).await?)
    }

    async fn statistics(&self, user_id: &str) -> Result<Vec<StatusCount>, ServiceError> {
        Ok(self.db.count_tasks_by_status(user_id).await?)
    }

    async fn tasks_by_user_and_status(
        &self,
        user_id: &str,
        status: Status,
    ) -> Result<Vec<Task>, ServiceError> {
        let filter = TaskFilter {
            user_id: Some(user_id.to_string()),
            status: Some(status),
            ..Default::default()
        };
        Ok(self.db.list_tasks(&filter).await?)
    }

    async fn read_attachment(&self, path: &str) -> Result<Bytes, ServiceError> {
        Ok(self.store.get(&attachment_key(path)).await?)
    }
}
