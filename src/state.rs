use crate::colorize::{ColorizeClient, HttpColorizeClient};
use crate::config::AppConfig;
use crate::session::{MemorySessionStore, SessionStore};
use crate::upload::{UploadBoard, UploadLimits};
use crate::users::{MemoryUserStore, PgUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub colorizer: Arc<dyn ColorizeClient>,
    pub uploads: UploadBoard,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;

                migrate(&db).await?;
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("no database configured; accounts are kept in memory and lost on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        let colorizer =
            Arc::new(HttpColorizeClient::new(&config.colorize_api_url)?) as Arc<dyn ColorizeClient>;
        tracing::info!(api = %config.colorize_api_url, "colorization api configured");

        Ok(Self::from_parts(
            config,
            users,
            Arc::new(MemorySessionStore::new()),
            colorizer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        colorizer: Arc<dyn ColorizeClient>,
    ) -> Self {
        let uploads = UploadBoard::new(UploadLimits {
            max_bytes: config.upload.max_bytes,
            error_display: config.upload.error_display(),
        });
        Self {
            config,
            users,
            sessions,
            colorizer,
            uploads,
        }
    }

    /// In-memory stores and the given stand-in for the colorization API.
    #[cfg(test)]
    pub fn fake(colorizer: crate::testing::StubColorizer) -> Self {
        use crate::config::{SessionConfig, UploadConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            colorize_api_url: crate::testing::StubColorizer::BASE_URL.into(),
            session: SessionConfig {
                cookie_name: "splash_session".into(),
                cookie_secure: false,
            },
            upload: UploadConfig {
                max_bytes: crate::upload::UploadLimits::default().max_bytes,
                error_display_secs: 5,
            },
        });

        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(colorizer),
        )
    }
}

/// Applies the embedded migrations. Without the `users` table no request can
/// succeed, so a failure stops startup.
async fn migrate(db: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await.map_err(|e| {
        tracing::error!(error = %e, "database migration failed");
        anyhow::Error::from(e).context("running database migrations")
    })?;
    tracing::info!("database migrations applied");
    Ok(())
}
