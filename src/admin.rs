use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::FromRow;
use tracing::instrument;

use crate::auth::jwt::AdminUser;
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::products::dto::ListResponse;
use crate::products::query::{paginate, PageParams};
use crate::products::repo::ProductStatus;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_identity): AdminUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<ListResponse<User>>, ApiError> {
    let page = PageParams::from_raw(q.page, q.limit);
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&state.db)
            .await?;
    let items = User::list(&state.db, page.limit, page.offset()).await?;
    Ok(Json(ListResponse {
        items,
        pagination: paginate(total, page),
    }))
}

#[derive(Debug, FromRow)]
struct StatusCount {
    status: ProductStatus,
    count: i64,
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_identity): AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
        .fetch_one(&state.db)
        .await?;
    let categories: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL")
            .fetch_one(&state.db)
            .await?;
    let by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM products \
         WHERE deleted_at IS NULL GROUP BY status",
    )
    .fetch_all(&state.db)
    .await?;

    let mut products = json!({ "available": 0, "sold": 0, "hidden": 0, "total": 0 });
    let mut total = 0i64;
    for row in by_status {
        products[row.status.as_str()] = json!(row.count);
        total += row.count;
    }
    products["total"] = json!(total);

    Ok(Json(json!({
        "users": users,
        "categories": categories,
        "products": products,
    })))
}
