use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, RegisterForm},
        services::{self, AuthError},
    },
    error,
    session::Session,
    state::AppState,
    views::{self, LoginView, RegisterView},
};

const REGISTERED: &str = "Account created successfully! Redirecting to login...";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

pub async fn login_page(session: Session) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(views::login_page(&LoginView::default())).into_response()
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let failed = |status: StatusCode, e: AuthError| {
        let view = LoginView {
            email: form.email.trim().to_string(),
            error: Some(e.to_string()),
            success: None,
        };
        (status, Html(views::login_page(&view))).into_response()
    };

    match services::authenticate(state.users.as_ref(), &form.email, &form.password).await {
        Ok(account) => {
            if let Some(replaced) = session.start(&account).await {
                state.uploads.discard(&replaced).await;
            }
            Redirect::to("/").into_response()
        }
        Err(e @ AuthError::Validation(_)) => failed(StatusCode::BAD_REQUEST, e),
        Err(e @ AuthError::InvalidCredentials) => failed(StatusCode::UNAUTHORIZED, e),
        Err(e) => error::internal(e),
    }
}

pub async fn register_page(session: Session) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(views::register_page(&RegisterView::default())).into_response()
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }

    let failed = |status: StatusCode, e: AuthError| {
        let view = RegisterView {
            full_name: form.full_name.trim().to_string(),
            email: form.email.trim().to_string(),
            error: Some(e.to_string()),
            success: None,
        };
        (status, Html(views::register_page(&view))).into_response()
    };

    match services::register_account(state.users.as_ref(), &form).await {
        Ok(_) => {
            let view = RegisterView {
                success: Some(REGISTERED.into()),
                ..RegisterView::default()
            };
            (
                [(header::REFRESH, "2;url=/login")],
                Html(views::register_page(&view)),
            )
                .into_response()
        }
        Err(e @ AuthError::Validation(_)) => failed(StatusCode::BAD_REQUEST, e),
        Err(e @ AuthError::DuplicateEmail) => failed(StatusCode::CONFLICT, e),
        Err(e) => error::internal(e),
    }
}

/// Ends the session, drops its upload state and returns to the login page.
pub async fn logout(State(state): State<AppState>, mut session: Session) -> Redirect {
    let user_id = session.current().map(|u| u.user_id);
    if let Some(token) = session.end().await {
        state.uploads.discard(&token).await;
        info!(?user_id, "user logged out");
    }
    Redirect::to("/login")
}
