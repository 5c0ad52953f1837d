use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Advisory lock key held while migrating ("tusk").
pub(crate) const MIGRATION_LOCK_KEY: i64 = 0x7475_736B;

const V1_INITIAL: &str = include_str!("sql/V1__initial.sql");

/// Bring the schema up to date.
///
/// The session-level advisory lock belongs to one backend connection, so the
/// lock, every migration step and the unlock all run on a single connection
/// taken out of the pool.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await.map_err(internal)?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(internal)?;

    let result = apply_pending(&mut *conn).await;

    match sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await
    {
        Ok(true) => {}
        Ok(false) => tracing::warn!("migration lock was not held at unlock"),
        Err(e) => {
            tracing::warn!("failed to release migration lock: {e}");
            // Don't hand a connection that may still hold the lock back to the pool.
            conn.detach();
        }
    }

    result
}

async fn apply_pending(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(internal)?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(internal)?;

    if current < 1 {
        sqlx::raw_sql(V1_INITIAL)
            .execute(&mut *conn)
            .await
            .map_err(internal)?;
        tracing::info!("applied postgres schema version 1");
    }

    Ok(())
}

fn internal(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    // Needs a running Postgres:
    //   DATABASE_URL=... cargo test -p tusk-db --features postgres -- --ignored
    #[tokio::test]
    #[ignore]
    async fn lock_is_released_after_migrating() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .unwrap();

        run(&pool).await.unwrap();
        run(&pool).await.unwrap();

        // A separate session must be able to take the lock straight away.
        let mut other = sqlx::PgConnection::connect(&url).await.unwrap();
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .fetch_one(&mut other)
            .await
            .unwrap();
        assert!(acquired);
        let _: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .fetch_one(&mut other)
            .await
            .unwrap();
    }
}
