use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::jwt::AuthUser;
use crate::categories::repo::Category;
use crate::error::ApiError;
use crate::products::dto::{
    CreateProductRequest, ListResponse, MyProductsQuery, ProductQuery, ProductView,
    UpdateProductRequest,
};
use crate::products::query::{
    count, fetch_page, paginate, PageParams, ProductFilter, SortDirection, SortField,
};
use crate::products::repo;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/my-products", get(my_products))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ProductQuery>,
) -> Result<Json<ListResponse<ProductView>>, ApiError> {
    let filter = ProductFilter {
        search: q.search,
        category: q.category,
        condition: q.condition,
        min_price: q.min_price,
        max_price: q.max_price,
        ..ProductFilter::public()
    };
    let sort = SortField::parse(q.sort.as_deref());
    let dir = SortDirection::parse(q.order.as_deref());
    let page = PageParams::from_raw(q.page, q.limit);

    let total = count(&state.db, &filter).await?;
    let rows = fetch_page(&state.db, &filter, sort, dir, page).await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(ProductView::from).collect(),
        pagination: paginate(total, page),
    }))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let row = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    // Best-effort counter; a failed bump never fails the read.
    let mut view = ProductView::from(row);
    match repo::bump_views(&state.db, id).await {
        Ok(()) => view.views += 1,
        Err(e) => warn!(error = %e, product_id = %id, "view count bump failed"),
    }

    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    payload.validate()?;

    if !Category::exists(&state.db, payload.category_id).await? {
        return Err(ApiError::Validation("Invalid category ID".into()));
    }

    let id = repo::insert(&state.db, identity.user_id, &payload).await?;
    let row = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("created product {id} not readable")))?;

    info!(product_id = %id, owner_id = %identity.user_id, "product created");
    Ok((StatusCode::CREATED, Json(ProductView::from(row))))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductView>, ApiError> {
    // Ownership is decided before the body is even looked at.
    let product = repo::find_owner(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    if product.owner_id != identity.user_id && identity.role != Role::Admin {
        warn!(product_id = %id, user_id = %identity.user_id, "update denied");
        return Err(ApiError::Forbidden("You can only update your own products".into()));
    }

    payload.validate()?;
    if let Some(category_id) = payload.category_id {
        if !Category::exists(&state.db, category_id).await? {
            return Err(ApiError::Validation("Invalid category ID".into()));
        }
    }

    repo::update(&state.db, id, &payload).await?;
    let row = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    info!(product_id = %id, "product updated");
    Ok(Json(ProductView::from(row)))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = repo::find_owner(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    if product.owner_id != identity.user_id && identity.role != Role::Admin {
        warn!(product_id = %id, user_id = %identity.user_id, "delete denied");
        return Err(ApiError::Forbidden("You can only delete your own products".into()));
    }

    repo::soft_delete(&state.db, id).await?;

    info!(product_id = %id, "product deleted");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

#[instrument(skip(state))]
pub async fn my_products(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(q): Query<MyProductsQuery>,
) -> Result<Json<ListResponse<ProductView>>, ApiError> {
    let filter = ProductFilter::owner(identity.user_id, q.status);
    let page = PageParams::from_raw(q.page, q.limit);

    let total = count(&state.db, &filter).await?;
    let rows = fetch_page(
        &state.db,
        &filter,
        SortField::CreatedAt,
        SortDirection::Desc,
        page,
    )
    .await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(ProductView::from).collect(),
        pagination: paginate(total, page),
    }))
}
