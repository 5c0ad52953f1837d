use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use tusk_core::task::{
    CreateTask, Status, StatusCount, Task, TaskFilter, TaskWithUser, UpdateTask,
};
use tusk_core::user::{Role, User};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

const TASK_WITH_USER_SELECT: &str = "SELECT t.*,
        u.role AS user_role, u.name AS user_name, u.email AS user_email,
        u.created_at AS user_created_at, u.updated_at AS user_updated_at
     FROM tasks t JOIN users u ON u.id = t.user_id";

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    user_id: String,
    title: String,
    description: String,
    status: String,
    revision: i32,
    due_date: String,
    submit_date: String,
    approve_date: String,
    rejected_date: String,
    reason: String,
    attachment: String,
    attachment_path: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            status: Status::parse_str(&r.status).unwrap_or(Status::Queue),
            revision: r.revision,
            due_date: r.due_date,
            submit_date: r.submit_date,
            approve_date: r.approve_date,
            rejected_date: r.rejected_date,
            reason: r.reason,
            attachment: r.attachment,
            attachment_path: r.attachment_path,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskWithUserRow {
    #[sqlx(flatten)]
    task: TaskRow,
    user_role: String,
    user_name: String,
    user_email: String,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
}

impl From<TaskWithUserRow> for TaskWithUser {
    fn from(r: TaskWithUserRow) -> Self {
        let task: Task = r.task.into();
        let user = User {
            id: task.user_id.clone(),
            role: Role::parse_str(&r.user_role).unwrap_or(Role::Employee),
            name: r.user_name,
            email: r.user_email,
            created_at: r.user_created_at,
            updated_at: r.user_updated_at,
        };
        TaskWithUser { task, user }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (
                 id, user_id, title, description, status, due_date, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.as_str())
        .bind(&input.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_task(&self, id: &str) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("task {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_task_with_user(&self, id: &str) -> Result<TaskWithUser, DbError> {
        let row = sqlx::query_as::<_, TaskWithUserRow>(&format!(
            "{TASK_WITH_USER_SELECT} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("task {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tasks WHERE 1=1");

        if let Some(ref user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        qb.push(" ORDER BY created_at ASC");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_task(
        &self,
        id: &str,
        update: &UpdateTask,
    ) -> Result<Task, DbError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(revision) = update.revision {
            qb.push(", revision = ").push_bind(revision);
        }
        if let Some(ref submit_date) = update.submit_date {
            qb.push(", submit_date = ").push_bind(submit_date.clone());
        }
        if let Some(ref approve_date) = update.approve_date {
            qb.push(", approve_date = ").push_bind(approve_date.clone());
        }
        if let Some(ref rejected_date) = update.rejected_date {
            qb.push(", rejected_date = ").push_bind(rejected_date.clone());
        }
        if let Some(ref reason) = update.reason {
            qb.push(", reason = ").push_bind(reason.clone());
        }
        if let Some(ref attachment) = update.attachment {
            qb.push(", attachment = ").push_bind(attachment.clone());
        }
        if let Some(ref attachment_path) = update.attachment_path {
            qb.push(", attachment_path = ").push_bind(attachment_path.clone());
        }

        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.push(" RETURNING *");

        let row = qb
            .build_query_as::<TaskRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("task {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_delete_task(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        Ok(())
    }

    pub(crate) async fn pg_list_review_queue(
        &self,
        limit: i64,
    ) -> Result<Vec<TaskWithUser>, DbError> {
        let rows = sqlx::query_as::<_, TaskWithUserRow>(&format!(
            "{TASK_WITH_USER_SELECT} WHERE t.status = $1 ORDER BY t.submit_date ASC LIMIT $2"
        ))
        .bind(Status::Review.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_list_in_progress(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Task>, DbError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks
             WHERE user_id = $1 AND (status <> $2 OR revision <> 0)
             ORDER BY updated_at ASC LIMIT $3",
        )
        .bind(user_id)
        .bind(Status::Queue.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_count_tasks_by_status(
        &self,
        user_id: &str,
    ) -> Result<Vec<StatusCount>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) AS total FROM tasks WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, total)| {
                Status::parse_str(&status).map(|status| StatusCount { status, total })
            })
            .collect())
    }
}
