pub mod dto;
pub mod error;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod ticket;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::public_routes())
        .merge(handlers::admin_routes())
}
