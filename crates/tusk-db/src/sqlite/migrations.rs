use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id            TEXT PRIMARY KEY,
                role          TEXT NOT NULL DEFAULT 'Employee'
                                  CHECK(role IN ('Admin', 'Employee')),
                name          TEXT NOT NULL,
                email         TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

            CREATE TABLE IF NOT EXISTS tasks (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                status          TEXT NOT NULL DEFAULT 'Queue'
                                    CHECK(status IN ('Queue', 'Review', 'Approved', 'Rejected')),
                revision        INTEGER NOT NULL DEFAULT 0 CHECK(revision >= 0),
                due_date        TEXT NOT NULL DEFAULT '',
                submit_date     TEXT NOT NULL DEFAULT '',
                approve_date    TEXT NOT NULL DEFAULT '',
                rejected_date   TEXT NOT NULL DEFAULT '',
                reason          TEXT NOT NULL DEFAULT '',
                attachment      TEXT NOT NULL DEFAULT '',
                attachment_path TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_user   ON tasks(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status, submit_date);
            ",
        )
        .to_db()?;

        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
            [],
        )
        .to_db()?;
        tracing::info!("applied sqlite schema version 1");
    }

    Ok(())
}
