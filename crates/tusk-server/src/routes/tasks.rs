use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Form, Json, Router,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tusk_core::task::{CreateTask, Status, StatusCount, Task, TaskWithUser};
use tusk_service::{TaskService, Upload};

use super::error::{bad_request, error_body, to_error, ApiError};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/review", get(needs_review))
        .route("/tasks/progress/{user_id}", get(in_progress))
        .route("/tasks/stat/{user_id}", get(statistics))
        .route("/tasks/user/{user_id}/{status}", get(by_user_and_status))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route("/tasks/{id}/submit", patch(submit_task))
        .route("/tasks/{id}/reject", patch(reject_task))
        .route("/tasks/{id}/fix", patch(fix_task))
        .route("/tasks/{id}/approve", patch(approve_task))
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(input) = payload.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .create_task(&input)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskWithUser>, ApiError> {
    state.service.get_task(&id).await.map(Json).map_err(to_error)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_task(&id).await.map_err(to_error)?;
    Ok(Json(json!({ "message": "Delete Task Success" })))
}

// -- Transitions --

async fn submit_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    let mut submit_date = String::new();
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_body(e.status(), e.body_text()))?
    {
        match field.name() {
            Some("submitDate") => {
                submit_date = field
                    .text()
                    .await
                    .map_err(|e| error_body(e.status(), e.body_text()))?;
            }
            Some("attachment") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| error_body(e.status(), e.body_text()))?;
                upload = Some(Upload { filename, data });
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| bad_request("attachment is required"))?;
    if upload.filename.is_empty() {
        return Err(bad_request("attachment has no filename"));
    }

    state
        .service
        .submit_task(&id, &submit_date, upload)
        .await
        .map_err(to_error)?;
    Ok(Json(json!("Submit to Review")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectForm {
    #[serde(default)]
    rejected_date: String,
    #[serde(default)]
    reason: String,
}

async fn reject_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<RejectForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let Form(form) = form.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .reject_task(&id, &form.reason, &form.rejected_date)
        .await
        .map_err(to_error)?;
    Ok(Json(json!("Rejected")))
}

#[derive(Debug, Deserialize)]
struct FixForm {
    #[serde(default)]
    revision: String,
}

async fn fix_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<FixForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let Form(form) = form.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .fix_task(&id, &form.revision)
        .await
        .map_err(to_error)?;
    Ok(Json(json!("Fix to Queue")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveForm {
    #[serde(default)]
    approve_date: String,
}

async fn approve_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<ApproveForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let Form(form) = form.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .approve_task(&id, &form.approve_date)
        .await
        .map_err(to_error)?;
    Ok(Json(json!("Approved")))
}

// -- Queries --

async fn needs_review(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskWithUser>>, ApiError> {
    state.service.needs_review().await.map(Json).map_err(to_error)
}

async fn in_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    state
        .service
        .in_progress(&user_id)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn statistics(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<StatusCount>>, ApiError> {
    state
        .service
        .statistics(&user_id)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn by_user_and_status(
    State(state): State<AppState>,
    Path((user_id, status)): Path<(String, String)>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let status = Status::parse_str(&status).ok_or_else(|| {
        error_body(StatusCode::BAD_REQUEST, format!("unknown status {status:?}"))
    })?;
    state
        .service
        .tasks_by_user_and_status(&user_id, status)
        .await
        .map(Json)
        .map_err(to_error)
}
