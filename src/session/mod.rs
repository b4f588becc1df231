mod store;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::debug;

pub use store::{MemorySessionStore, SessionData, SessionStore, SessionToken};

use crate::{config::SessionConfig, state::AppState, users::Account};

/// Request-scoped view of the caller's session.
///
/// Extracted from the session cookie on every request; handlers use it to
/// start, inspect and end the session instead of touching the store directly.
pub struct Session {
    store: Arc<dyn SessionStore>,
    cookies: Cookies,
    config: SessionConfig,
    token: Option<SessionToken>,
    data: Option<SessionData>,
}

impl Session {
    /// Marks the browser as signed in as `account`. A session the browser
    /// already had is destroyed and its token returned, so state keyed by it
    /// can be dropped too.
    pub async fn start(&mut self, account: &Account) -> Option<SessionToken> {
        let replaced = self.token.take();
        if let Some(old) = &replaced {
            self.store.destroy(old).await;
        }

        let data = SessionData::for_account(account);
        let token = self.store.create(data.clone()).await;

        let mut cookie = Cookie::new(self.config.cookie_name.clone(), token.clone());
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.config.cookie_secure);
        self.cookies.add(cookie);

        debug!(user_id = %data.user_id, "session started");
        self.token = Some(token);
        self.data = Some(data);
        replaced
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    pub fn current(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    /// Destroys the session and clears the cookie. Returns the ended token.
    pub async fn end(&mut self) -> Option<SessionToken> {
        let token = self.token.take()?;
        self.store.destroy(&token).await;
        self.data = None;

        let mut removal = Cookie::from(self.config.cookie_name.clone());
        removal.set_path("/");
        self.cookies.remove(removal);
        Some(token)
    }

    pub fn into_parts(self) -> Option<(SessionToken, SessionData)> {
        self.token.zip(self.data)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state).await?;
        let config = state.config.session.clone();

        let presented = cookies
            .get(&config.cookie_name)
            .map(|c| c.value().to_string());
        let (token, data) = match presented {
            Some(token) => match state.sessions.get(&token).await {
                Some(data) => (Some(token), Some(data)),
                // stale cookie, e.g. after a restart of the in-memory store
                None => (None, None),
            },
            None => (None, None),
        };

        Ok(Session {
            store: state.sessions.clone(),
            cookies,
            config,
            token,
            data,
        })
    }
}
