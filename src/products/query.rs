use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::products::dto::Pagination;
use crate::products::repo::{ProductStatus, ProductWithRefs, PRODUCT_SELECT};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Allow-listed sort columns. Caller text never reaches the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    CreatedAt,
    Views,
}

impl SortField {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("price") => SortField::Price,
            Some("views") => SortField::Views,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::Price => "p.price",
            SortField::CreatedAt => "p.created_at",
            SortField::Views => "p.views",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Page window after coercion: `page >= 1`, `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn from_raw(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Who the result set is for: the public storefront or one owner's shelf.
#[derive(Debug, Clone)]
pub enum QueryScope {
    Public,
    Owner {
        owner_id: Uuid,
        status: Option<ProductStatus>,
    },
}

#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub scope: QueryScope,
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn public() -> Self {
        Self {
            scope: QueryScope::Public,
            search: None,
            category: None,
            condition: None,
            min_price: None,
            max_price: None,
        }
    }

    pub fn owner(owner_id: Uuid, status: Option<ProductStatus>) -> Self {
        Self {
            scope: QueryScope::Owner { owner_id, status },
            search: None,
            category: None,
            condition: None,
            min_price: None,
            max_price: None,
        }
    }

    fn nonempty(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Appends the WHERE clause. Every caller value goes through `push_bind`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE p.deleted_at IS NULL");

        match &self.scope {
            QueryScope::Public => {
                qb.push(" AND p.status = ").push_bind(ProductStatus::Available);
            }
            QueryScope::Owner { owner_id, status } => {
                qb.push(" AND p.owner_id = ").push_bind(*owner_id);
                if let Some(status) = status {
                    qb.push(" AND p.status = ").push_bind(*status);
                }
            }
        }

        if let Some(search) = Self::nonempty(&self.search) {
            let pattern = format!("%{search}%");
            qb.push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category) = Self::nonempty(&self.category) {
            qb.push(" AND c.name = ").push_bind(category.to_string());
        }

        if let Some(condition) = Self::nonempty(&self.condition) {
            qb.push(" AND p.condition = ").push_bind(condition.to_string());
        }

        // Non-positive bounds are indistinguishable from "no filter".
        if let Some(min) = self.min_price.filter(|p| *p > 0.0) {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = self.max_price.filter(|p| *p > 0.0) {
            qb.push(" AND p.price <= ").push_bind(max);
        }
    }
}

pub async fn count(db: &PgPool, filter: &ProductFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id",
    );
    filter.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(db).await
}

pub async fn fetch_page(
    db: &PgPool,
    filter: &ProductFilter,
    sort: SortField,
    dir: SortDirection,
    page: PageParams,
) -> Result<Vec<ProductWithRefs>, sqlx::Error> {
    let mut qb = QueryBuilder::new(PRODUCT_SELECT);
    filter.push_where(&mut qb);
    qb.push(" ORDER BY ")
        .push(sort.column())
        .push(" ")
        .push(dir.sql())
        // Tiebreaker keeps paging deterministic when the sort key repeats.
        .push(", p.id ASC")
        .push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb.build_query_as::<ProductWithRefs>().fetch_all(db).await
}

pub fn paginate(total_count: i64, page: PageParams) -> Pagination {
    let total_pages = if total_count == 0 {
        0
    } else {
        (total_count + page.limit - 1) / page.limit
    };
    Pagination {
        current_page: page.page,
        total_pages,
        total_count,
        has_next: page.page < total_pages,
        has_prev: page.page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_falls_back_to_created_at() {
        assert_eq!(SortField::parse(Some("price")), SortField::Price);
        assert_eq!(SortField::parse(Some("views")), SortField::Views);
        assert_eq!(SortField::parse(Some("created_at")), SortField::CreatedAt);
        assert_eq!(SortField::parse(None), SortField::CreatedAt);
        // Anything outside the allow-list, however hostile, degrades to the default.
        assert_eq!(
            SortField::parse(Some("price; DROP TABLE products")),
            SortField::CreatedAt
        );
        assert_eq!(SortField::parse(Some("p.owner_id")), SortField::CreatedAt);
    }

    #[test]
    fn sort_direction_defaults_to_desc() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn page_params_coerce_invalid_input() {
        let p = PageParams::from_raw(None, None);
        assert_eq!((p.page, p.limit), (1, DEFAULT_PAGE_SIZE));

        let p = PageParams::from_raw(Some(0), Some(0));
        assert_eq!((p.page, p.limit), (1, 1));

        let p = PageParams::from_raw(Some(-3), Some(100_000));
        assert_eq!((p.page, p.limit), (1, MAX_PAGE_SIZE));

        let p = PageParams::from_raw(Some(3), Some(12));
        assert_eq!(p.offset(), 24);
    }

    #[test]
    fn pagination_math_is_exact() {
        let meta = paginate(0, PageParams::from_raw(Some(1), Some(12)));
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);

        let meta = paginate(24, PageParams::from_raw(Some(1), Some(12)));
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = paginate(25, PageParams::from_raw(Some(2), Some(12)));
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let meta = paginate(25, PageParams::from_raw(Some(3), Some(12)));
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn public_filter_pins_available_status() {
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        ProductFilter::public().push_where(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("p.deleted_at IS NULL"));
        assert!(sql.contains("p.status = $1"));
    }

    #[test]
    fn caller_text_is_always_bound_never_spliced() {
        let filter = ProductFilter {
            search: Some("phone'; DROP TABLE products; --".into()),
            category: Some("Electronics".into()),
            condition: Some("good".into()),
            min_price: Some(10.0),
            max_price: Some(500.0),
            ..ProductFilter::public()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        filter.push_where(&mut qb);
        let sql = qb.sql();
        assert!(!sql.contains("DROP TABLE"));
        assert!(!sql.contains("Electronics"));
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("p.price >="));
        assert!(sql.contains("p.price <="));
    }

    #[test]
    fn non_positive_price_bounds_are_ignored() {
        let filter = ProductFilter {
            min_price: Some(0.0),
            max_price: Some(-10.0),
            ..ProductFilter::public()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        filter.push_where(&mut qb);
        let sql = qb.sql();
        assert!(!sql.contains("p.price"));
    }

    #[test]
    fn blank_search_and_category_apply_no_filter() {
        let filter = ProductFilter {
            search: Some("   ".into()),
            category: Some("".into()),
            ..ProductFilter::public()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        filter.push_where(&mut qb);
        let sql = qb.sql();
        assert!(!sql.contains("ILIKE"));
        assert!(!sql.contains("c.name"));
    }

    #[test]
    fn owner_scope_binds_owner_and_optional_status() {
        let filter = ProductFilter::owner(Uuid::new_v4(), Some(ProductStatus::Sold));
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        filter.push_where(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("p.owner_id = $1"));
        assert!(sql.contains("p.status = $2"));

        let filter = ProductFilter::owner(Uuid::new_v4(), None);
        let mut qb = QueryBuilder::new("SELECT 1 FROM products p");
        filter.push_where(&mut qb);
        assert!(!qb.sql().contains("p.status"));
    }
}
