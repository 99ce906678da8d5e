use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::products::repo::{ProductStatus, ProductWithRefs};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub condition: String,
    pub location: String,
    #[serde(default)]
    pub is_negotiable: bool,
    pub category_id: Uuid,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::Validation("Description is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ApiError::Validation("Price must be non-negative".into()));
        }
        if self.images.is_empty() {
            return Err(ApiError::Validation("At least one image is required".into()));
        }
        if self.condition.trim().is_empty() {
            return Err(ApiError::Validation("Condition is required".into()));
        }
        if self.location.trim().is_empty() {
            return Err(ApiError::Validation("Location is required".into()));
        }
        Ok(())
    }
}

/// Partial update. `None` leaves a field unchanged; present values must still
/// satisfy the listing invariants.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub is_negotiable: Option<bool>,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(ApiError::Validation("Title cannot be empty".into()));
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err(ApiError::Validation("Description cannot be empty".into()));
        }
        if matches!(self.price, Some(p) if !p.is_finite() || p < 0.0) {
            return Err(ApiError::Validation("Price must be non-negative".into()));
        }
        if matches!(&self.images, Some(imgs) if imgs.is_empty()) {
            return Err(ApiError::Validation("At least one image is required".into()));
        }
        if matches!(&self.condition, Some(c) if c.trim().is_empty()) {
            return Err(ApiError::Validation("Condition cannot be empty".into()));
        }
        if matches!(&self.location, Some(l) if l.trim().is_empty()) {
            return Err(ApiError::Validation("Location cannot be empty".into()));
        }
        Ok(())
    }
}

/// Untrusted public listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    #[serde(alias = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(alias = "maxPrice")]
    pub max_price: Option<f64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyProductsQuery {
    pub status: Option<ProductStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Seller as embedded in listing responses. No password-bearing type in sight.
#[derive(Debug, Serialize)]
pub struct OwnerView {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
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
    pub owner: OwnerView,
    pub category: CategoryRef,
}

impl From<ProductWithRefs> for ProductView {
    fn from(r: ProductWithRefs) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            price: r.price,
            images: r.images,
            condition: r.condition,
            location: r.location,
            is_negotiable: r.is_negotiable,
            status: r.status,
            views: r.views,
            sold_at: r.sold_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            owner: OwnerView {
                id: r.owner_id,
                email: r.owner_email,
                username: r.owner_username,
                first_name: r.owner_first_name,
                last_name: r.owner_last_name,
                phone: r.owner_phone,
                city: r.owner_city,
                state: r.owner_state,
            },
            category: CategoryRef {
                id: r.category_id,
                name: r.category_name,
                slug: r.category_slug,
                icon: r.category_icon,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProductRequest {
        CreateProductRequest {
            title: "iPhone 12".into(),
            description: "Lightly used, no scratches".into(),
            price: 25000.0,
            images: vec!["https://cdn.example/p/1.jpg".into()],
            condition: "good".into(),
            location: "Mumbai".into(),
            is_negotiable: true,
            category_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn create_accepts_valid_listing() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn create_rejects_negative_price() {
        let mut req = valid_create();
        req.price = -5.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_accepts_zero_price_but_rejects_empty_images() {
        let mut req = valid_create();
        req.price = 0.0;
        req.images = vec![];
        assert!(req.validate().is_err());
        req.images = vec!["https://cdn.example/p/1.jpg".into()];
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_rejects_blank_required_fields() {
        let mut req = valid_create();
        req.title = "   ".into();
        assert!(req.validate().is_err());

        let mut req = valid_create();
        req.condition = "".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = UpdateProductRequest::default();
        assert!(patch.validate().is_ok());

        let patch = UpdateProductRequest {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = UpdateProductRequest {
            images: Some(vec![]),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = UpdateProductRequest {
            title: Some("New title".into()),
            status: Some(ProductStatus::Sold),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn product_query_accepts_camel_case_price_aliases() {
        let q: ProductQuery =
            serde_json::from_str(r#"{"minPrice": 100.0, "maxPrice": 50.0}"#).unwrap();
        assert_eq!(q.min_price, Some(100.0));
        assert_eq!(q.max_price, Some(50.0));
    }
}
