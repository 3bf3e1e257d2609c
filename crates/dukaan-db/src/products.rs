//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, doc_id, title, price, old_price, discount, image, description, \
     bullets, category, stock, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub doc_id: String,
    pub title: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub discount: Option<String>,
    pub image: String,
    pub description: Option<String>,
    pub bullets: Vec<String>,
    pub category: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authoritative price of one product, used for server-side total
/// recomputation at order creation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductPriceRow {
    pub doc_id: String,
    pub price: Decimal,
}

/// Catalog filters for [`list_products`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductListFilters<'a> {
    /// Exact category match; `"all"` and `None` both mean no filter.
    pub category: Option<&'a str>,
    /// Case-insensitive title substring.
    pub q: Option<&'a str>,
    pub limit: Option<i64>,
}

/// Fields for a new catalog product.
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub doc_id: &'a str,
    pub title: &'a str,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub discount: Option<&'a str>,
    pub image: &'a str,
    pub description: Option<&'a str>,
    pub bullets: &'a [String],
    pub category: &'a str,
    pub stock: i32,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns catalog products, newest first, honoring the filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductListFilters<'_>,
) -> Result<Vec<ProductRow>, DbError> {
    let category = filters.category.filter(|c| *c != "all");

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE ($1::TEXT IS NULL OR category = $1) \
           AND ($2::TEXT IS NULL OR title ILIKE '%' || $2 || '%') \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(category)
    .bind(filters.q)
    .bind(filters.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single product by document id, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_doc_id(
    pool: &PgPool,
    doc_id: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE doc_id = $1"
    ))
    .bind(doc_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a catalog product and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// `doc_id` unique violation).
pub async fn create_product(pool: &PgPool, new: &NewProduct<'_>) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
           (doc_id, title, price, old_price, discount, image, description, bullets, category, stock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(new.doc_id)
    .bind(new.title)
    .bind(new.price)
    .bind(new.old_price)
    .bind(new.discount)
    .bind(new.image)
    .bind(new.description)
    .bind(new.bullets)
    .bind(new.category)
    .bind(new.stock)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the authoritative prices for the given document ids. Ids not
/// present in the catalog are simply absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn prices_for_ids(
    pool: &PgPool,
    doc_ids: &[String],
) -> Result<Vec<ProductPriceRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductPriceRow>(
        "SELECT doc_id, price FROM products WHERE doc_id = ANY($1)",
    )
    .bind(doc_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
