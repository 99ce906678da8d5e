use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Reference data owned by the listing store; this core only reads it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Category {
    pub async fn list_all(db: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, icon, is_active, created_at, updated_at \
             FROM categories WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(db)
        .await
    }

    pub async fn exists(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(db)
        .await
    }
}

/// Available-listing count per active category.
#[derive(Debug, Serialize, FromRow)]
pub struct CategoryStat {
    pub category_id: Uuid,
    pub category_name: String,
    pub product_count: i64,
}

pub async fn stats(db: &PgPool) -> Result<Vec<CategoryStat>, sqlx::Error> {
    sqlx::query_as::<_, CategoryStat>(
        "SELECT c.id AS category_id, c.name AS category_name, COUNT(p.id) AS product_count \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE p.status = 'available' AND p.deleted_at IS NULL \
           AND c.is_active = TRUE AND c.deleted_at IS NULL \
         GROUP BY c.id, c.name \
         ORDER BY product_count DESC",
    )
    .fetch_all(db)
    .await
}
