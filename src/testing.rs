//! Test doubles shared by the unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    colorize::{ColorizeClient, ColorizeError, ColorizeResponse, HealthStatus},
    upload::ImageFile,
};

#[derive(Clone)]
enum Mode {
    Succeed,
    Fail(Option<String>),
    Unreachable,
}

/// Plays the colorization API and counts outbound colorize calls.
#[derive(Clone)]
pub struct StubColorizer {
    mode: Mode,
    calls: Arc<AtomicUsize>,
}

impl StubColorizer {
    pub const BASE_URL: &'static str = "http://colorize.test";

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_mode(Mode::Succeed)
    }

    pub fn failing(error: Option<&str>) -> Self {
        Self::with_mode(Mode::Fail(error.map(str::to_owned)))
    }

    pub fn unreachable() -> Self {
        Self::with_mode(Mode::Unreachable)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ColorizeClient for StubColorizer {
    fn base_url(&self) -> &str {
        Self::BASE_URL
    }

    async fn colorize(&self, image: &ImageFile) -> Result<ColorizeResponse, ColorizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            Mode::Succeed => Ok(ColorizeResponse {
                success: true,
                download_url: Some(format!("/download/colorized_{}", image.file_name)),
                error: None,
                message: Some("Image colorized successfully".into()),
                output_filename: Some(format!("colorized_{}", image.file_name)),
            }),
            Mode::Fail(error) => Ok(ColorizeResponse {
                success: false,
                download_url: None,
                error: error.clone(),
                message: None,
                output_filename: None,
            }),
            Mode::Unreachable => Err(ColorizeError::Status(reqwest::StatusCode::BAD_GATEWAY)),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<Bytes, ColorizeError> {
        match self.mode {
            Mode::Unreachable => Err(ColorizeError::Status(reqwest::StatusCode::BAD_GATEWAY)),
            _ if url.starts_with(Self::BASE_URL) => Ok(Bytes::from_static(b"\xFF\xD8\xFF\xE0colorized")),
            _ => Err(ColorizeError::Status(reqwest::StatusCode::NOT_FOUND)),
        }
    }

    async fn health(&self) -> Result<HealthStatus, ColorizeError> {
        match self.mode {
            Mode::Unreachable => Err(ColorizeError::Status(reqwest::StatusCode::BAD_GATEWAY)),
            _ => Ok(HealthStatus {
                status: Some("running".into()),
                message: None,
                model_loaded: true,
            }),
        }
    }
}
