use crate::state::AppState;
use axum::Router;

mod dto;
mod email;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
