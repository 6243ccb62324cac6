use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod images;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
