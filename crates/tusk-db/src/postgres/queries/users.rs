use chrono::{DateTime, Utc};

use tusk_core::user::{EmployeeSummary, NewUser, Role, User, UserRecord};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    role: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(r: UserRow) -> Self {
        UserRecord {
            user: User {
                id: r.id,
                role: Role::parse_str(&r.role).unwrap_or(Role::Employee),
                name: r.name,
                email: r.email,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            password_hash: r.password_hash,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_user(&self, input: &NewUser) -> Result<User, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, role, name, email, password_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&id)
        .bind(input.role.as_str())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(UserRecord::from(row).user)
    }

    pub(crate) async fn pg_get_user(&self, id: &str) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("user {id}")))?;

        Ok(UserRecord::from(row).user)
    }

    pub(crate) async fn pg_find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(row.map(UserRecord::from))
    }

    pub(crate) async fn pg_list_employees(&self) -> Result<Vec<EmployeeSummary>, DbError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE role = $1 ORDER BY name ASC")
                .bind(Role::Employee.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(pg_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| EmployeeSummary { id, name })
            .collect())
    }

    pub(crate) async fn pg_delete_user(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(result.rows_affected() > 0)
    }
}
