pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use tusk_core::task::{CreateTask, StatusCount, Task, TaskFilter, TaskWithUser, UpdateTask};
use tusk_core::user::{EmployeeSummary, NewUser, User, UserRecord};

use crate::{Database, DbError};

/// Map a sqlx::Error into a DbError, singling out unique violations.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            DbError::Conflict(e.to_string())
        }
        other => DbError::Internal(other.to_string()),
    }
}

/// Create a DbError::NotFound with the given entity description.
pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    // -- Users --
    async fn create_user(&self, input: &NewUser) -> Result<User, DbError> {
        self.pg_create_user(input).await
    }
    async fn get_user(&self, id: &str) -> Result<User, DbError> {
        self.pg_get_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbError> {
        self.pg_find_user_by_email(email).await
    }
    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, DbError> {
        self.pg_list_employees().await
    }
    async fn delete_user(&self, id: &str) -> Result<bool, DbError> {
        self.pg_delete_user(id).await
    }

    // -- Tasks --
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.pg_create_task(input).await
    }
    async fn get_task(&self, id: &str) -> Result<Task, DbError> {
        self.pg_get_task(id).await
    }
    async fn get_task_with_user(&self, id: &str) -> Result<TaskWithUser, DbError> {
        self.pg_get_task_with_user(id).await
    }
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
        self.pg_list_tasks(filter).await
    }
    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, DbError> {
        self.pg_update_task(id, update).await
    }
    async fn delete_task(&self, id: &str) -> Result<(), DbError> {
        self.pg_delete_task(id).await
    }
    async fn list_review_queue(&self, limit: i64) -> Result<Vec<TaskWithUser>, DbError> {
        self.pg_list_review_queue(limit).await
    }
    async fn list_in_progress(&self, user_id: &str, limit: i64) -> Result<Vec<Task>, DbError> {
        self.pg_list_in_progress(user_id, limit).await
    }
    async fn count_tasks_by_status(&self, user_id: &str) -> Result<Vec<StatusCount>, DbError> {
        self.pg_count_tasks_by_status(user_id).await
    }
}
