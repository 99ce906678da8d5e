use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::dto::{CreateProductRequest, UpdateProductRequest};

/// Listing lifecycle. Soft deletion is a separate `deleted_at` column, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Sold,
    Hidden,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Sold => "sold",
            ProductStatus::Hidden => "hidden",
        }
    }
}

/// Joined select: every listing row carries its owner and category columns.
pub const PRODUCT_SELECT: &str = "SELECT p.id, p.title, p.description, p.price, p.images, \
     p.condition, p.location, p.is_negotiable, p.status, p.views, p.sold_at, \
     p.created_at, p.updated_at, \
     u.id AS owner_id, u.email AS owner_email, u.username AS owner_username, \
     u.first_name AS owner_first_name, u.last_name AS owner_last_name, \
     u.phone AS owner_phone, u.city AS owner_city, u.state AS owner_state, \
     c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
     c.icon AS category_icon \
     FROM products p \
     JOIN users u ON u.id = p.owner_id \
     JOIN categories c ON c.id = p.category_id";

/// Flat row shape for the joined select.
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithRefs {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub condition: String,
    pub location: String,
    pub is_negotiable: bool,
    pub status: ProductStatus,
    pub views: i64,
    pub sold_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_username: Option<String>,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_phone: Option<String>,
    pub owner_city: Option<String>,
    pub owner_state: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: Option<String>,
    pub category_icon: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct ProductOwner {
    pub id: Uuid,
    pub owner_id: Uuid,
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<ProductWithRefs>, sqlx::Error> {
    sqlx::query_as::<_, ProductWithRefs>(&format!(
        "{PRODUCT_SELECT} WHERE p.id = $1 AND p.deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Minimal row for the ownership check, fetched before any mutation.
pub async fn find_owner(db: &PgPool, id: Uuid) -> Result<Option<ProductOwner>, sqlx::Error> {
    sqlx::query_as::<_, ProductOwner>(
        "SELECT id, owner_id FROM products WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert(
    db: &PgPool,
    owner_id: Uuid,
    req: &CreateProductRequest,
) -> Result<Uuid, sqlx::Error> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO products \
             (owner_id, category_id, title, description, price, images, \
              condition, location, is_negotiable) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(owner_id)
    .bind(req.category_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.price)
    .bind(&req.images)
    .bind(&req.condition)
    .bind(&req.location)
    .bind(req.is_negotiable)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// Typed patch. The first transition to `sold` stamps `sold_at`; later status
/// changes leave it untouched.
pub async fn update(db: &PgPool, id: Uuid, patch: &UpdateProductRequest) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products SET \
             title         = COALESCE($2, title), \
             description   = COALESCE($3, description), \
             price         = COALESCE($4, price), \
             images        = COALESCE($5, images), \
             condition     = COALESCE($6, condition), \
             location      = COALESCE($7, location), \
             is_negotiable = COALESCE($8, is_negotiable), \
             category_id   = COALESCE($9, category_id), \
             sold_at       = CASE WHEN $10 = 'sold' AND status <> 'sold' \
                                  THEN now() ELSE sold_at END, \
             status        = COALESCE($10, status), \
             updated_at    = now() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.price)
    .bind(patch.images.as_deref())
    .bind(patch.condition.as_deref())
    .bind(patch.location.as_deref())
    .bind(patch.is_negotiable)
    .bind(patch.category_id)
    .bind(patch.status)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn soft_delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products SET deleted_at = now(), updated_at = now() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

/// Best-effort view counter. Races may undercount; callers must not fail on error.
pub async fn bump_views(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::Available).unwrap(),
            r#""available""#
        );
        let status: ProductStatus = serde_json::from_str(r#""sold""#).unwrap();
        assert_eq!(status, ProductStatus::Sold);
    }

    #[test]
    fn status_as_str_covers_all_variants() {
        assert_eq!(ProductStatus::Available.as_str(), "available");
        assert_eq!(ProductStatus::Sold.as_str(), "sold");
        assert_eq!(ProductStatus::Hidden.as_str(), "hidden");
    }
}
