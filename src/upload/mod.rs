use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod board;
pub mod handlers;
mod machine;
pub mod services;

pub use board::UploadBoard;
pub use machine::{ImageFile, Phase, UploadError, UploadLimits, UploadMachine, ZoomTarget};

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_SLACK: usize = 1024 * 1024;

pub fn router(limits: &UploadLimits) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/colorize",
            post(handlers::colorize)
                .layer(DefaultBodyLimit::max(limits.max_bytes + MULTIPART_SLACK)),
        )
        .route("/results/original", get(handlers::original))
        .route("/download", get(handlers::download))
        .route("/reset", post(handlers::reset))
        .route("/api/health", get(handlers::api_health))
}
