use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tusk_service::TaskService;

use super::error::{to_error, ApiError};
use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/attachments/{*path}", get(download))
}

async fn download(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.service.read_attachment(&path).await.map_err(to_error)?;
    let content_type = content_type_for(&path);

    let mut resp = ([(header::CONTENT_TYPE, content_type)], data).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    if content_type == OCTET_STREAM {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
    }
    Ok(resp)
}

const OCTET_STREAM: &str = "application/octet-stream";

/// HTML and SVG are not listed; they download as octet-stream.
fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use super::content_type_for;
    use crate::test_helpers::{empty_request, read_json, test_router};

    #[test]
    fn guesses_from_extension() {
        assert_eq!(content_type_for("abc/Report.PDF"), "application/pdf");
        assert_eq!(content_type_for("abc/photo.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("abc/notes"), "application/octet-stream");
        assert_eq!(content_type_for("abc/archive.tar.gz"), "application/octet-stream");
        assert_eq!(content_type_for("abc/page.html"), "application/octet-stream");
        assert_eq!(content_type_for("abc/page.HTM"), "application/octet-stream");
        assert_eq!(content_type_for("abc/logo.svg"), "application/octet-stream");
    }

    #[tokio::test]
    async fn unknown_attachment_is_not_found() {
        let (app, _dir) = test_router();
        let resp = app
            .oneshot(empty_request(Method::GET, "/attachments/nope/missing.txt"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(read_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (app, _dir) = test_router();
        let resp = app
            .oneshot(empty_request(Method::GET, "/attachments/x/%2E%2E/%2E%2E/tusk.db"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
