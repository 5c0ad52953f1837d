mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tusk_service::LocalService;

pub use routes::{build_router, AppState, InnerAppState};

/// Default request body cap, sized for submission uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn serve(
    listener: TcpListener,
    service: LocalService,
    max_upload_bytes: usize,
) -> Result<()> {
    let state = Arc::new(InnerAppState {
        service,
        max_upload_bytes,
    });
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
