use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::views;

/// Logs a failure the user cannot act on and answers with a 500 page.
pub fn internal<E: std::fmt::Display>(err: E) -> Response {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(views::error_page(
            "Something went wrong. Please try again later.",
        )),
    )
        .into_response()
}
