use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tusk_core::user::{Credentials, EmployeeSummary, RegisterUser, User};
use tusk_service::UserService;

use super::error::{bad_request, to_error, ApiError};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/Employee", get(list_employees))
        .route("/users/{id}", delete(delete_user))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(credentials) = payload.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .login(&credentials)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(input) = payload.map_err(|e| bad_request(e.body_text()))?;
    state
        .service
        .register(&input)
        .await
        .map(Json)
        .map_err(to_error)
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_user(&id).await.map_err(to_error)?;
    Ok(Json(json!({ "message": "Delete User Success" })))
}

async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeSummary>>, ApiError> {
    state
        .service
        .list_employees()
        .await
        .map(Json)
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_helpers::{empty_request, json_request, read_json, test_router};

    #[tokio::test]
    async fn register_then_login_with_default_password() {
        let (app, _dir) = test_router();

        let resp = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/users",
                &json!({ "email": "ani@go.id", "name": "Ani", "password": "ignored" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let user = read_json(resp).await;
        assert_eq!(user["role"], "Employee");
        assert_eq!(user["email"], "ani@go.id");
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());

        let resp = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/users/login",
                &json!({ "email": "ani@go.id", "password": "123456" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let logged_in = read_json(resp).await;
        assert_eq!(logged_in["id"], user["id"]);
        assert!(logged_in.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_bad_request() {
        let (app, _dir) = test_router();
        let body = json!({ "email": "dup@go.id", "name": "Dup", "password": "" });

        let first = app
            .clone()
            .oneshot(json_request(Method::POST, "/users", &body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .clone()
            .oneshot(json_request(Method::POST, "/users", &body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(second).await["error"], "Email already exist");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (app, _dir) = test_router();
        app.clone()
            .oneshot(json_request(
                Method::POST,
                "/users",
                &json!({ "email": "b@go.id", "name": "B", "password": "" }),
            ))
            .await
            .unwrap();

        for body in [
            json!({ "email": "b@go.id", "password": "nope" }),
            json!({ "email": "ghost@go.id", "password": "123456" }),
        ] {
            let resp = app
                .clone()
                .oneshot(json_request(Method::POST, "/users/login", &body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(read_json(resp).await["error"], "Email or Password is Wrong");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (app, _dir) = test_router();
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/users/login")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn list_and_delete_employees() {
        let (app, _dir) = test_router();
        let resp = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/users",
                &json!({ "email": "c@go.id", "name": "Citra", "password": "" }),
            ))
            .await
            .unwrap();
        let id = read_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(empty_request(Method::GET, "/users/Employee"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            read_json(resp).await,
            json!([{ "id": id, "name": "Citra" }])
        );

        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(empty_request(Method::DELETE, &format!("/users/{id}")))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                read_json(resp).await,
                json!({ "message": "Delete User Success" })
            );
        }

        let resp = app
            .oneshot(empty_request(Method::GET, "/users/Employee"))
            .await
            .unwrap();
        assert_eq!(read_json(resp).await, json!([]));
    }
}
