use chrono::Utc;
use rusqlite::{params, Row};

use tusk_core::task::{
    CreateTask, Status, StatusCount, Task, TaskFilter, TaskWithUser, UpdateTask,
};
use tusk_core::user::{Role, User};

use super::super::{map_not_found, SqliteDatabase, SqliteResultExt};
use crate::DbError;

/// Task columns plus the owning user's columns under a `user_` prefix.
const TASK_WITH_USER_SELECT: &str = "SELECT t.*,
        u.role AS user_role, u.name AS user_name, u.email AS user_email,
        u.created_at AS user_created_at, u.updated_at AS user_updated_at
     FROM tasks t JOIN users u ON u.id = t.user_id";

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: Status::parse_str(&status_str).unwrap_or(Status::Queue),
        revision: row.get("revision")?,
        due_date: row.get("due_date")?,
        submit_date: row.get("submit_date")?,
        approve_date: row.get("approve_date")?,
        rejected_date: row.get("rejected_date")?,
        reason: row.get("reason")?,
        attachment: row.get("attachment")?,
        attachment_path: row.get("attachment_path")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_task_with_user(row: &Row) -> rusqlite::Result<TaskWithUser> {
    let task = row_to_task(row)?;
    let role_str: String = row.get("user_role")?;
    let user = User {
        id: task.user_id.clone(),
        role: Role::parse_str(&role_str).unwrap_or(Role::Employee),
        name: row.get("user_name")?,
        email: row.get("user_email")?,
        created_at: row.get("user_created_at")?,
        updated_at: row.get("user_updated_at")?,
    };
    Ok(TaskWithUser { task, user })
}

impl SqliteDatabase {
    pub fn create_task_sync(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();

            conn.execute(
                "INSERT INTO tasks (
                    id, user_id, title, description, status, due_date, created_at, updated_at
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    input.user_id,
                    input.title,
                    input.description,
                    input.status.as_str(),
                    input.due_date,
                    now,
                    now,
                ],
            )
            .to_db()?;

            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .to_db()
        })
    }

    pub fn get_task_sync(&self, id: &str) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .map_err(map_not_found(format!("task {id}")))
        })
    }

    pub fn get_task_with_user_sync(&self, id: &str) -> Result<TaskWithUser, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{TASK_WITH_USER_SELECT} WHERE t.id = ?1"),
                params![id],
                row_to_task_with_user,
            )
            .map_err(map_not_found(format!("task {id}")))
        })
    }

    pub fn list_tasks_sync(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE 1=1");
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref user_id) = filter.user_id {
                param_values.push(Box::new(user_id.clone()));
                sql.push_str(&format!(" AND user_id = ?{}", param_values.len()));
            }
            if let Some(status) = filter.status {
                param_values.push(Box::new(status.as_str().to_string()));
                sql.push_str(&format!(" AND status = ?{}", param_values.len()));
            }

            sql.push_str(" ORDER BY created_at ASC");

            if let Some(limit) = filter.limit {
                param_values.push(Box::new(limit));
                sql.push_str(&format!(" LIMIT ?{}", param_values.len()));
            }

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let mut stmt = conn.prepare(&sql).to_db()?;
            let tasks = stmt
                .query_map(params_ref.as_slice(), row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn update_task_sync(&self, id: &str, update: &UpdateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(status) = update.status {
                param_values.push(Box::new(status.as_str().to_string()));
                sets.push(format!("status = ?{}", param_values.len()));
            }
            if let Some(revision) = update.revision {
                param_values.push(Box::new(revision));
                sets.push(format!("revision = ?{}", param_values.len()));
            }
            if let Some(ref submit_date) = update.submit_date {
                param_values.push(Box::new(submit_date.clone()));
                sets.push(format!("submit_date = ?{}", param_values.len()));
            }
            if let Some(ref approve_date) = update.approve_date {
                param_values.push(Box::new(approve_date.clone()));
                sets.push(format!("approve_date = ?{}", param_values.len()));
            }
            if let Some(ref rejected_date) = update.rejected_date {
                param_values.push(Box::new(rejected_date.clone()));
                sets.push(format!("rejected_date = ?{}", param_values.len()));
            }
            if let Some(ref reason) = update.reason {
                param_values.push(Box::new(reason.clone()));
                sets.push(format!("reason = ?{}", param_values.len()));
            }
            if let Some(ref attachment) = update.attachment {
                param_values.push(Box::new(attachment.clone()));
                sets.push(format!("attachment = ?{}", param_values.len()));
            }
            if let Some(ref attachment_path) = update.attachment_path {
                param_values.push(Box::new(attachment_path.clone()));
                sets.push(format!("attachment_path = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id.to_string()));
            let id_param = param_values.len();

            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                id_param
            );

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let changed = conn.execute(&sql, params_ref.as_slice()).to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }

            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .to_db()
        })
    }

    pub fn delete_task_sync(&self, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM tasks WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }

    pub fn list_review_queue_sync(&self, limit: i64) -> Result<Vec<TaskWithUser>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{TASK_WITH_USER_SELECT} WHERE t.status = ?1
                     ORDER BY t.submit_date ASC LIMIT ?2"
                ))
                .to_db()?;
            let tasks = stmt
                .query_map(
                    params![Status::Review.as_str(), limit],
                    row_to_task_with_user,
                )
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn list_in_progress_sync(&self, user_id: &str, limit: i64) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM tasks
                     WHERE user_id = ?1 AND (status != ?2 OR revision != 0)
                     ORDER BY updated_at ASC LIMIT ?3",
                )
                .to_db()?;
            let tasks = stmt
                .query_map(
                    params![user_id, Status::Queue.as_str(), limit],
                    row_to_task,
                )
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn count_tasks_by_status_sync(&self, user_id: &str) -> Result<Vec<StatusCount>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT status, COUNT(*) AS total FROM tasks
                     WHERE user_id = ?1 GROUP BY status",
                )
                .to_db()?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(rows
                .into_iter()
                .filter_map(|(status, total)| {
                    Status::parse_str(&status).map(|status| StatusCount { status, total })
                })
                .collect())
        })
    }
}
