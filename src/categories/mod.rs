use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(handlers::list_categories))
        .route("/categories/stats", get(handlers::category_stats))
}
