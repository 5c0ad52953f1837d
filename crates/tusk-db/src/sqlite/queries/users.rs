use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use tusk_core::user::{EmployeeSummary, NewUser, Role, User, UserRecord};

use super::super::{map_not_found, SqliteDatabase, SqliteResultExt};
use crate::DbError;

pub(crate) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        role: Role::parse_str(&role_str).unwrap_or(Role::Employee),
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_record(row: &Row) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user: row_to_user(row)?,
        password_hash: row.get("password_hash")?,
    })
}

impl SqliteDatabase {
    pub fn create_user_sync(&self, input: &NewUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (id, role, name, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    input.role.as_str(),
                    input.name,
                    input.email,
                    input.password_hash,
                    now,
                    now,
                ],
            )
            .to_db()?;
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .to_db()
        })
    }

    pub fn get_user_sync(&self, id: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
                .map_err(map_not_found(format!("user {id}")))
        })
    }

    pub fn find_user_by_email_sync(&self, email: &str) -> Result<Option<UserRecord>, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email],
                row_to_record,
            )
            .optional()
            .to_db()
        })
    }

    pub fn list_employees_sync(&self) -> Result<Vec<EmployeeSummary>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name FROM users WHERE role = ?1 ORDER BY name ASC")
                .to_db()?;
            let employees = stmt
                .query_map(params![Role::Employee.as_str()], |row| {
                    Ok(EmployeeSummary {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                })
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(employees)
        })
    }

    pub fn delete_user_sync(&self, id: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM users WHERE id = ?1", params![id])
                .to_db()?;
            Ok(changed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use tusk_core::user::{NewUser, Role};

    use crate::{DbError, SqliteDatabase};

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            role,
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$hash".into(),
        }
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.create_user_sync(&new_user("a@x.id", Role::Employee))
            .unwrap();
        let err = db
            .create_user_sync(&new_user("a@x.id", Role::Employee))
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn email_lookup_is_case_sensitive() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.create_user_sync(&new_user("a@x.id", Role::Employee))
            .unwrap();
        assert!(db.find_user_by_email_sync("A@x.id").unwrap().is_none());
        let record = db.find_user_by_email_sync("a@x.id").unwrap().unwrap();
        assert_eq!(record.password_hash, "$2b$04$hash");
    }

    #[test]
    fn list_employees_skips_admins() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.create_user_sync(&new_user("owner@x.id", Role::Admin))
            .unwrap();
        let emp = db
            .create_user_sync(&new_user("emp@x.id", Role::Employee))
            .unwrap();
        let employees = db.list_employees_sync().unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, emp.id);
        assert_eq!(employees[0].name, "emp");
    }

    #[test]
    fn delete_unknown_user_reports_false() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(!db.delete_user_sync("missing").unwrap());
    }
}
