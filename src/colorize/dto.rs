use serde::{Deserialize, Serialize};

/// Body returned by `POST {API_BASE}/colorize`, on success and on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorizeResponse {
    pub success: bool,
    #[serde(default)]
    pub download_url: Option<String>, // path on the API, e.g. /download/colorized_<id>.jpg
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_filename: Option<String>,
}

/// Body returned by `GET {API_BASE}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_loaded: bool,
}

impl HealthStatus {
    pub fn unreachable() -> Self {
        Self {
            status: Some("unreachable".into()),
            message: None,
            model_loaded: false,
        }
    }
}
