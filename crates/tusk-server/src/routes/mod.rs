pub mod attachments;
mod error;
pub mod health;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tusk_service::LocalService;

pub struct InnerAppState {
    pub service: LocalService,
    /// Cap on request bodies, multipart submissions included.
    pub max_upload_bytes: usize,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(tasks::routes())
        .merge(attachments::routes())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
