// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use tusk_core::task::{CreateTask, Status, StatusCount, TaskFilter, UpdateTask};
use tusk_core::user::{NewUser, Role};
use tusk_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_user(email: &str, role: Role) -> NewUser {
    NewUser {
        role,
        name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$not-a-real-hash".into(),
    }
}

fn make_task(user_id: &str, title: &str) -> CreateTask {
    CreateTask {
        user_id: user_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        status: Status::Queue,
        due_date: String::new(),
    }
}

async fn submit(db: &dyn Database, task_id: &str, submit_date: &str) {
    db.update_task(
        task_id,
        &UpdateTask {
            status: Some(Status::Review),
            submit_date: Some(submit_date.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// User tests
// ---------------------------------------------------------------------------

/// Create, look up by id and email, list employees, delete.
pub async fn test_user_crud(db: &dyn Database) {
    let owner = db
        .create_user(&make_user("owner@go.id", Role::Admin))
        .await
        .unwrap();
    assert_eq!(owner.role, Role::Admin);

    let emp = db
        .create_user(&make_user("ani@go.id", Role::Employee))
        .await
        .unwrap();
    assert_eq!(emp.role, Role::Employee);
    assert_eq!(emp.name, "ani");

    let fetched = db.get_user(&emp.id).await.unwrap();
    assert_eq!(fetched.email, "ani@go.id");

    let record = db.find_user_by_email("ani@go.id").await.unwrap().unwrap();
    assert_eq!(record.user.id, emp.id);
    assert_eq!(record.password_hash, "$2b$04$not-a-real-hash");
    assert!(db.find_user_by_email("nobody@go.id").await.unwrap().is_none());

    let employees = db.list_employees().await.unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].id, emp.id);

    assert!(db.delete_user(&emp.id).await.unwrap());
    assert!(!db.delete_user(&emp.id).await.unwrap());
    assert!(matches!(
        db.get_user(&emp.id).await,
        Err(DbError::NotFound(_))
    ));
}

/// A second row with the same email is a conflict.
pub async fn test_duplicate_email(db: &dyn Database) {
    db.create_user(&make_user("dup@go.id", Role::Employee))
        .await
        .unwrap();
    let err = db
        .create_user(&make_user("dup@go.id", Role::Employee))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Task tests
// ---------------------------------------------------------------------------

/// Create, get, get with user, update, delete.
pub async fn test_task_crud(db: &dyn Database) {
    let user = db
        .create_user(&make_user("budi@go.id", Role::Employee))
        .await
        .unwrap();

    let task = db.create_task(&make_task(&user.id, "Draft")).await.unwrap();
    assert_eq!(task.status, Status::Queue);
    assert_eq!(task.revision, 0);
    assert_eq!(task.submit_date, "");
    assert_eq!(task.attachment, "");

    let loaded = db.get_task_with_user(&task.id).await.unwrap();
    assert_eq!(loaded.task.id, task.id);
    assert_eq!(loaded.user.email, "budi@go.id");

    let updated = db
        .update_task(
            &task.id,
            &UpdateTask {
                status: Some(Status::Rejected),
                reason: Some("missing page 3".into()),
                rejected_date: Some("2024-02-01".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, Status::Rejected);
    assert_eq!(updated.reason, "missing page 3");
    assert_eq!(updated.rejected_date, "2024-02-01");

    let fixed = db
        .update_task(
            &task.id,
            &UpdateTask {
                status: Some(Status::Queue),
                revision: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(fixed.status, Status::Queue);
    assert_eq!(fixed.revision, 1);
    assert_eq!(fixed.reason, "missing page 3");

    assert!(matches!(
        db.update_task("missing", &UpdateTask::default()).await,
        Err(DbError::NotFound(_))
    ));

    db.delete_task(&task.id).await.unwrap();
    assert!(matches!(
        db.get_task(&task.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.get_task_with_user(&task.id).await,
        Err(DbError::NotFound(_))
    ));
}

/// Filter by user and status.
pub async fn test_task_filtering(db: &dyn Database) {
    let a = db
        .create_user(&make_user("a@go.id", Role::Employee))
        .await
        .unwrap();
    let b = db
        .create_user(&make_user("b@go.id", Role::Employee))
        .await
        .unwrap();

    let t1 = db.create_task(&make_task(&a.id, "a1")).await.unwrap();
    db.create_task(&make_task(&a.id, "a2")).await.unwrap();
    db.create_task(&make_task(&b.id, "b1")).await.unwrap();
    submit(db, &t1.id, "2024-03-01").await;

    let a_queue = db
        .list_tasks(&TaskFilter {
            user_id: Some(a.id.clone()),
            status: Some(Status::Queue),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(a_queue.len(), 1);
    assert_eq!(a_queue[0].title, "a2");

    let a_review = db
        .list_tasks(&TaskFilter {
            user_id: Some(a.id.clone()),
            status: Some(Status::Review),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(a_review.len(), 1);
    assert_eq!(a_review[0].id, t1.id);

    let all = db.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let limited = db
        .list_tasks(&TaskFilter {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

/// Review queue is capped and ordered by submit date.
pub async fn test_review_queue(db: &dyn Database) {
    let user = db
        .create_user(&make_user("rq@go.id", Role::Employee))
        .await
        .unwrap();

    let late = db.create_task(&make_task(&user.id, "late")).await.unwrap();
    let early = db.create_task(&make_task(&user.id, "early")).await.unwrap();
    let middle = db.create_task(&make_task(&user.id, "middle")).await.unwrap();
    db.create_task(&make_task(&user.id, "queued")).await.unwrap();

    submit(db, &late.id, "2024-05-03").await;
    submit(db, &early.id, "2024-05-01").await;
    submit(db, &middle.id, "2024-05-02").await;

    let queue = db.list_review_queue(2).await.unwrap();
    let ids: Vec<&str> = queue.iter().map(|t| t.task.id.as_str()).collect();
    assert_eq!(ids, vec![early.id.as_str(), middle.id.as_str()]);
    assert_eq!(queue[0].user.id, user.id);
}

/// In-progress excludes untouched queued tasks, includes revised ones.
pub async fn test_in_progress(db: &dyn Database) {
    let user = db
        .create_user(&make_user("ip@go.id", Role::Employee))
        .await
        .unwrap();
    let other = db
        .create_user(&make_user("other@go.id", Role::Employee))
        .await
        .unwrap();

    let fresh = db.create_task(&make_task(&user.id, "fresh")).await.unwrap();
    let submitted = db.create_task(&make_task(&user.id, "submitted")).await.unwrap();
    let revised = db.create_task(&make_task(&user.id, "revised")).await.unwrap();
    let foreign = db.create_task(&make_task(&other.id, "foreign")).await.unwrap();

    submit(db, &submitted.id, "2024-06-01").await;
    db.update_task(
        &revised.id,
        &UpdateTask {
            revision: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    submit(db, &foreign.id, "2024-06-01").await;

    let tasks = db.list_in_progress(&user.id, 5).await.unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![submitted.id.as_str(), revised.id.as_str()]);
    assert!(!ids.contains(&fresh.id.as_str()));

    let capped = db.list_in_progress(&user.id, 1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, submitted.id);
}

/// Status counts per user.
pub async fn test_count_by_status(db: &dyn Database) {
    let user = db
        .create_user(&make_user("stat@go.id", Role::Employee))
        .await
        .unwrap();

    db.create_task(&make_task(&user.id, "q1")).await.unwrap();
    db.create_task(&make_task(&user.id, "q2")).await.unwrap();
    let done = db.create_task(&make_task(&user.id, "done")).await.unwrap();
    db.update_task(
        &done.id,
        &UpdateTask {
            status: Some(Status::Approved),
            approve_date: Some("2024-07-01".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut counts = db.count_tasks_by_status(&user.id).await.unwrap();
    counts.sort_by_key(|c| c.status.as_str());
    assert_eq!(
        counts,
        vec![
            StatusCount {
                status: Status::Approved,
                total: 1
            },
            StatusCount {
                status: Status::Queue,
                total: 2
            },
        ]
    );

    assert!(db.count_tasks_by_status("nobody").await.unwrap().is_empty());
}
