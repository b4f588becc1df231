use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest image accepted before any request leaves the server.
    pub max_bytes: usize,
    /// How long an upload error stays on screen before the UI returns to idle.
    pub error_display_secs: u64,
}

impl UploadConfig {
    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the server against the in-memory user store.
    pub database_url: Option<String>,
    pub colorize_api_url: String,
    pub session: SessionConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().or_else(database_url_from_parts);
        let colorize_api_url = std::env::var("COLORIZE_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".into())
            .trim_end_matches('/')
            .to_string();
        anyhow::ensure!(
            colorize_api_url.starts_with("http://") || colorize_api_url.starts_with("https://"),
            "COLORIZE_API_URL must be an http(s) URL, got {colorize_api_url:?}"
        );

        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "splash_session".into()),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };
        let upload = UploadConfig {
            max_bytes: std::env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(10)
                * 1024
                * 1024,
            error_display_secs: std::env::var("ERROR_DISPLAY_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5),
        };

        Ok(Self {
            database_url,
            colorize_api_url,
            session,
            upload,
        })
    }
}

/// Builds a Postgres URL from `DB_HOST`/`DB_USER`/`DB_PASS`/`DB_NAME` when
/// `DATABASE_URL` is not set. Returns `None` unless at least a host is given.
fn database_url_from_parts() -> Option<String> {
    let host = std::env::var("DB_HOST").ok()?;
    let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("DB_USER").unwrap_or_else(|_| "postgres".into());
    let pass = std::env::var("DB_PASS").unwrap_or_default();
    let name = std::env::var("DB_NAME").unwrap_or_else(|_| "splash_colorization".into());
    Some(compose_database_url(&host, &port, &user, &pass, &name))
}

fn compose_database_url(host: &str, port: &str, user: &str, pass: &str, name: &str) -> String {
    if pass.is_empty() {
        format!("postgres://{user}@{host}:{port}/{name}")
    } else {
        format!("postgres://{user}:{pass}@{host}:{port}/{name}")
    }
}
