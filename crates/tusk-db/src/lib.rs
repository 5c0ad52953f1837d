#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tusk_core::task::{CreateTask, StatusCount, Task, TaskFilter, TaskWithUser, UpdateTask};
use tusk_core::user::{EmployeeSummary, NewUser, User, UserRecord};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Internal(String),
}

/// Persistence gateway over the `users` and `tasks` tables.
///
/// Every method is a single statement (or a read followed by a read-back);
/// nothing here spans a transaction.
#[async_trait]
pub trait Database: Send + Sync {
    // -- Users --
    async fn create_user(&self, input: &NewUser) -> Result<User, DbError>;
    async fn get_user(&self, id: &str) -> Result<User, DbError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbError>;
    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, DbError>;
    /// Removes the user if present. Returns whether a row was deleted.
    async fn delete_user(&self, id: &str) -> Result<bool, DbError>;

    // -- Tasks --
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError>;
    async fn get_task(&self, id: &str) -> Result<Task, DbError>;
    async fn get_task_with_user(&self, id: &str) -> Result<TaskWithUser, DbError>;
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, DbError>;
    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, DbError>;
    async fn delete_task(&self, id: &str) -> Result<(), DbError>;
    /// Tasks in `Review`, oldest submission first.
    async fn list_review_queue(&self, limit: i64) -> Result<Vec<TaskWithUser>, DbError>;
    /// A user's tasks that have left the queue at least once, least recently
    /// modified first.
    async fn list_in_progress(&self, user_id: &str, limit: i64) -> Result<Vec<Task>, DbError>;
    async fn count_tasks_by_status(&self, user_id: &str) -> Result<Vec<StatusCount>, DbError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Case-insensitive backend name, as given in `TUSK_DB_BACKEND`.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "postgres" | "postgresql" => Some(Backend::Postgres),
            _ => None,
        }
    }

    fn from_setting(value: Option<&str>) -> Self {
        match value {
            None => Backend::Sqlite,
            Some(name) => Backend::parse_str(name).unwrap_or_else(|| {
                tracing::warn!("unknown TUSK_DB_BACKEND {name:?}, falling back to sqlite");
                Backend::Sqlite
            }),
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub backend: Backend,
    /// SQLite file path. Defaults to `<data_dir>/tusk.db`.
    pub sqlite_path: Option<String>,
    /// Postgres connection URL.
    pub database_url: Option<String>,
}

impl DbConfig {
    /// Build from `TUSK_DB_BACKEND`, `TUSK_SQLITE_PATH` and
    /// `TUSK_DATABASE_URL` (or `DATABASE_URL`).
    pub fn from_env() -> Self {
        let backend = Backend::from_setting(std::env::var("TUSK_DB_BACKEND").ok().as_deref());
        Self {
            backend,
            sqlite_path: std::env::var("TUSK_SQLITE_PATH").ok(),
            database_url: std::env::var("TUSK_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .ok(),
        }
    }
}

/// Open whichever backend the configuration selects.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    match config.backend {
        Backend::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let db = SqliteDatabase::open(config)?;
                Ok(Arc::new(db))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(DbError::Internal(
                    "sqlite backend requested but the 'sqlite' feature is not enabled".into(),
                ))
            }
        }
        Backend::Postgres => {
            #[cfg(feature = "postgres")]
            {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    DbError::Internal("postgres backend requires TUSK_DATABASE_URL".into())
                })?;
                let db = postgres::PostgresDatabase::connect(url).await?;
                Ok(Arc::new(db))
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(DbError::Internal(
                    "postgres backend requested but the 'postgres' feature is not enabled".into(),
                ))
            }
        }
    }
}

/// Default directory for the database file and attachments.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("tusk")
}
