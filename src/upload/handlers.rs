use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::CurrentUser,
    colorize::HealthStatus,
    state::AppState,
    upload::{services, ImageFile, UploadError, ZoomTarget},
    views::{self, HomeView, UploadView},
};

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// `original` or `colorized`; anything else shows the comparison.
    pub view: Option<String>,
}

impl HomeQuery {
    fn zoom(&self) -> Option<ZoomTarget> {
        match self.view.as_deref() {
            Some("original") => Some(ZoomTarget::Original),
            Some("colorized") => Some(ZoomTarget::Colorized),
            _ => None,
        }
    }
}

/// JSON answer to `POST /colorize`.
#[derive(Debug, Serialize)]
pub struct ColorizeReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorized_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// How long the browser keeps the error banner up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_ms: Option<u64>,
}

impl ColorizeReply {
    fn done(colorized_url: String) -> Self {
        Self {
            success: true,
            colorized_url: Some(colorized_url),
            original_url: Some("/results/original"),
            download_url: Some("/download"),
            error: None,
            display_ms: None,
        }
    }

    fn failed(err: &UploadError, display_ms: u64) -> Self {
        Self {
            success: false,
            colorized_url: None,
            original_url: None,
            download_url: None,
            error: Some(err.to_string()),
            display_ms: Some(display_ms),
        }
    }
}

fn status_for(err: &UploadError) -> StatusCode {
    match err {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        UploadError::Busy | UploadError::Reset => StatusCode::CONFLICT,
        UploadError::NoResult => StatusCode::NOT_FOUND,
        UploadError::Remote(_) | UploadError::Network | UploadError::Download => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(state: &AppState, err: UploadError) -> Response {
    let display_ms = state.uploads.limits().error_display.as_millis() as u64;
    (status_for(&err), Json(ColorizeReply::failed(&err, display_ms))).into_response()
}

/// Main page. `?view=original|colorized` opens the zoomed view of a result;
/// without it the page shows the side-by-side comparison.
#[instrument(skip(state, user, query), fields(user_id = %user.user.user_id))]
pub async fn home(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HomeQuery>,
) -> Html<String> {
    let upload = state
        .uploads
        .with(&user.token, |m| {
            m.expire_error(Instant::now());
            match query.zoom() {
                Some(target) => {
                    // nothing to zoom into unless a result is ready
                    let _ = m.zoom(target);
                }
                None => m.back(),
            }
            UploadView::from(&*m)
        })
        .await;

    Html(views::home_page(&HomeView {
        name: user.user.name,
        email: user.user.email,
        upload,
    }))
}

fn read_error(err: MultipartError, limit_mb: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit_mb }
    } else {
        warn!(error = %err, "malformed upload body");
        UploadError::NoFile
    }
}

/// Pulls the `image` field out of the upload form. An empty part (no file
/// chosen) counts as no file.
async fn read_image(mut multipart: Multipart, limit_mb: usize) -> Result<Option<ImageFile>, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, limit_mb))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| read_error(e, limit_mb))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(ImageFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

#[instrument(skip(state, user, multipart), fields(user_id = %user.user.user_id))]
pub async fn colorize(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Response {
    let limit_mb = state.uploads.limits().limit_mb();
    let file = match read_image(multipart, limit_mb).await {
        Ok(file) => file,
        Err(e) => {
            let err = services::reject(&state.uploads, &user.token, e).await;
            return failure(&state, err);
        }
    };

    match services::submit(&state.uploads, state.colorizer.as_ref(), &user.token, file).await {
        Ok(url) => Json(ColorizeReply::done(url)).into_response(),
        Err(err) => failure(&state, err),
    }
}

#[instrument(skip(state, user), fields(user_id = %user.user.user_id))]
pub async fn original(State(state): State<AppState>, user: CurrentUser) -> Response {
    match services::original(&state.uploads, &user.token).await {
        Some(image) => (
            [(header::CONTENT_TYPE, image.content_type)],
            image.bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, UploadError::NoResult.to_string()).into_response(),
    }
}

#[instrument(skip(state, user), fields(user_id = %user.user.user_id))]
pub async fn download(State(state): State<AppState>, user: CurrentUser) -> Response {
    match services::download(&state.uploads, state.colorizer.as_ref(), &user.token).await {
        Ok(file) => {
            info!(size = file.bytes.len(), "download served");
            (
                [
                    (header::CONTENT_TYPE, file.content_type.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file.file_name),
                    ),
                ],
                file.bytes,
            )
                .into_response()
        }
        Err(err) => (status_for(&err), err.to_string()).into_response(),
    }
}

#[instrument(skip(state, user), fields(user_id = %user.user.user_id))]
pub async fn reset(State(state): State<AppState>, user: CurrentUser) -> Redirect {
    services::reset(&state.uploads, &user.token).await;
    Redirect::to("/")
}

pub async fn api_health(State(state): State<AppState>, _user: CurrentUser) -> Response {
    match state.colorizer.health().await {
        Ok(health) => Json(health).into_response(),
        Err(e) => {
            warn!(error = %e, "colorization api health check failed");
            (StatusCode::BAD_GATEWAY, Json(HealthStatus::unreachable())).into_response()
        }
    }
}
