//! User-owned recipe attributes: tags and ingredients. Both share one
//! list/create contract, so the handlers and queries are generic over the
//! entity instead of being written twice.

use axum::{routing::get, Router};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;

pub use repo::{Ingredient, Tag};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tags",
            get(handlers::list_attrs::<Tag>).post(handlers::create_attr::<Tag>),
        )
        .route(
            "/ingredients",
            get(handlers::list_attrs::<Ingredient>).post(handlers::create_attr::<Ingredient>),
        )
}
