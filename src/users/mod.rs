use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
mod view;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
