use crate::state::AppState;
use axum::Router;

pub mod credentials;
pub mod dto;
pub(crate) mod extractors;
pub mod google;
pub mod handlers;
pub mod oauth;
pub mod password;
pub mod session;
pub mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::oauth_routes())
}
