use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    session::{Session, SessionData, SessionToken},
    state::AppState,
};

/// Gatekeeper for protected routes.
///
/// Resolves the caller's session; without one the request ends here with a
/// redirect to the login page.
pub struct CurrentUser {
    pub token: SessionToken,
    pub user: SessionData,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match session.into_parts() {
            Some((token, user)) => Ok(CurrentUser { token, user }),
            None => {
                debug!(uri = %parts.uri, "no active session; redirecting to login");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
