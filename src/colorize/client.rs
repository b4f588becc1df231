use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use crate::{
    colorize::dto::{ColorizeResponse, HealthStatus},
    upload::ImageFile,
};

#[derive(Debug, thiserror::Error)]
pub enum ColorizeError {
    #[error("colorization api request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("colorization api returned {0}")]
    Status(reqwest::StatusCode),
}

/// The external colorization service.
#[async_trait]
pub trait ColorizeClient: Send + Sync {
    /// Base URL without a trailing slash; relative download paths resolve against it.
    fn base_url(&self) -> &str;

    /// `POST {base}/colorize` with the image in multipart field `image`.
    /// The JSON body is returned whatever the status code.
    async fn colorize(&self, image: &ImageFile) -> Result<ColorizeResponse, ColorizeError>;

    async fn fetch_image(&self, url: &str) -> Result<Bytes, ColorizeError>;

    /// `GET {base}/`.
    async fn health(&self) -> Result<HealthStatus, ColorizeError>;
}

/// reqwest-backed client. No timeout or retry is configured.
#[derive(Clone)]
pub struct HttpColorizeClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpColorizeClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ColorizeClient for HttpColorizeClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, image), fields(file = %image.file_name, size = image.size()))]
    async fn colorize(&self, image: &ImageFile) -> Result<ColorizeResponse, ColorizeError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part("image", part);

        let res = self
            .http
            .post(format!("{}/colorize", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let status = res.status();
        let body = res.json::<ColorizeResponse>().await?;
        debug!(%status, success = body.success, "colorize response");
        Ok(body)
    }

    #[instrument(skip(self))]
    async fn fetch_image(&self, url: &str) -> Result<Bytes, ColorizeError> {
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            return Err(ColorizeError::Status(res.status()));
        }
        Ok(res.bytes().await?)
    }

    async fn health(&self) -> Result<HealthStatus, ColorizeError> {
        let res = self.http.get(format!("{}/", self.base_url)).send().await?;
        Ok(res.json::<HealthStatus>().await?)
    }
}
