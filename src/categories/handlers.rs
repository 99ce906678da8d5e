use axum::{extract::State, Json};
use tracing::instrument;

use crate::categories::repo::{self, Category, CategoryStat};
use crate::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = Category::list_all(&state.db).await?;
    Ok(Json(categories))
}

#[instrument(skip(state))]
pub async fn category_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryStat>>, ApiError> {
    let stats = repo::stats(&state.db).await?;
    Ok(Json(stats))
}
