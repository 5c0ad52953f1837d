use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tusk_service::LocalService;
use tusk_store::StoreConfig;

use crate::InnerAppState;

/// Cheapest bcrypt cost; keeps account tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Build a router over in-memory SQLite and a temporary attachment
/// directory. Keep the returned `TempDir` alive for the test's duration.
pub fn test_router() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(tusk_db::SqliteDatabase::open_in_memory().unwrap());
    let store = tusk_store::create_store(&StoreConfig {
        local_data_dir: Some(dir.path().to_string_lossy().to_string()),
    })
    .unwrap();
    let service = LocalService::new(db, store).with_bcrypt_cost(TEST_BCRYPT_COST);
    let state = Arc::new(InnerAppState {
        service,
        max_upload_bytes: crate::DEFAULT_MAX_UPLOAD_BYTES,
    });
    (crate::build_router(state), dir)
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn form_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

const BOUNDARY: &str = "tusk-test-boundary";

/// `PATCH /tasks/{id}/submit` with a `submitDate` field and one file.
pub fn submit_request(
    task_id: &str,
    submit_date: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"submitDate\"\r\n\r\n");
    body.extend_from_slice(format!("{submit_date}\r\n").as_bytes());
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"attachment\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/tasks/{task_id}/submit"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn read_bytes(resp: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn read_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&read_bytes(resp).await).unwrap()
}
