use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, instrument};

use crate::state::AppState;

async fn table_count(db: &PgPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(db).await
}

/// Store connectivity plus live row counts.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.db).await {
        error!(error = %e, "health ping failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "Database ping failed",
                "database": "disconnected",
            })),
        )
            .into_response();
    }

    let counts = tokio::try_join!(
        table_count(&state.db, "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL"),
        table_count(&state.db, "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL"),
        table_count(&state.db, "SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL"),
    );

    match counts {
        Ok((users, products, categories)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "tradepost API is running",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "connected",
                "stats": {
                    "users": users,
                    "products": products,
                    "categories": categories,
                },
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "health stats query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Database error",
                    "database": "connected",
                })),
            )
                .into_response()
        }
    }
}
