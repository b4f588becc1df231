use bytes::Bytes;
use tracing::{error, info, warn};

use crate::{
    colorize::{ColorizeClient, ColorizeResponse},
    upload::{
        board::UploadBoard,
        machine::{ImageFile, UploadError},
    },
};

pub const DOWNLOAD_FILE_NAME: &str = "colorized_image.jpg";
const GENERIC_FAILURE: &str = "Colorization failed. Please try again.";

/// The processed image, ready to be sent as an attachment.
pub struct Download {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

/// Joins a download path from the API onto its base URL. Absolute URLs pass through.
pub fn resolve_download_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn interpret(resp: ColorizeResponse, base: &str) -> Result<String, UploadError> {
    match (resp.success, resp.download_url) {
        (true, Some(path)) if !path.is_empty() => Ok(resolve_download_url(base, &path)),
        (true, _) => Err(UploadError::Remote(GENERIC_FAILURE.into())),
        (false, _) => Err(UploadError::Remote(
            resp.error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.into()),
        )),
    }
}

/// Runs one upload for a session: checks the file, sends it to the
/// colorization API and records the outcome. Returns the absolute URL of the
/// processed image.
pub async fn submit(
    board: &UploadBoard,
    colorizer: &dyn ColorizeClient,
    token: &str,
    file: Option<ImageFile>,
) -> Result<String, UploadError> {
    let (id, image) = board
        .with(token, |m| {
            m.select(file)?;
            m.begin_submit()
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "upload rejected");
            e
        })?;

    let outcome = match colorizer.colorize(&image).await {
        Ok(resp) => interpret(resp, colorizer.base_url()),
        Err(e) => {
            error!(error = %e, "colorization api unreachable");
            Err(UploadError::Network)
        }
    };

    board
        .with(token, |m| {
            m.finish(id, outcome)
                .map(|result| result.download_url)
        })
        .await
        .map(|url| {
            info!(file = %image.file_name, size = image.size(), "image colorized");
            url
        })
}

/// Records an upload that failed before a file could be read, e.g. an oversized body.
pub async fn reject(board: &UploadBoard, token: &str, err: UploadError) -> UploadError {
    warn!(error = %err, "upload rejected");
    board.with(token, |m| m.fail(err)).await
}

pub async fn original(board: &UploadBoard, token: &str) -> Option<ImageFile> {
    board
        .with(token, |m| m.result().map(|r| r.original.clone()))
        .await
}

pub async fn download(
    board: &UploadBoard,
    colorizer: &dyn ColorizeClient,
    token: &str,
) -> Result<Download, UploadError> {
    let url = board
        .with(token, |m| m.download_url().map(str::to_owned))
        .await
        .ok_or(UploadError::NoResult)?;

    let bytes = colorizer.fetch_image(&url).await.map_err(|e| {
        error!(error = %e, %url, "download failed");
        UploadError::Download
    })?;

    Ok(Download {
        file_name: DOWNLOAD_FILE_NAME,
        content_type: "image/jpeg",
        bytes,
    })
}

pub async fn reset(board: &UploadBoard, token: &str) {
    board.with(token, |m| m.reset()).await;
}
