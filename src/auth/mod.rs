use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
mod password;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
