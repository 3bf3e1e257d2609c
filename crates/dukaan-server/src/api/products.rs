//! Catalog endpoints: listing with filters, single-product lookup, and
//! product creation (admin).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dukaan_core::ids::DocId;
use dukaan_db::{NewProduct, ProductListFilters, ProductRow};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A catalog product as clients see it. The document id goes out as
/// `_id` so cart snapshots parse it without remapping.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductResponse {
    #[serde(rename = "_id")]
    doc_id: String,
    title: String,
    price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discount: Option<String>,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    bullets: Vec<String>,
    category: String,
    stock: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            // CHAR(24) comes back space-padded when an id is short.
            doc_id: row.doc_id.trim().to_owned(),
            title: row.title,
            price: row.price,
            old_price: row.old_price,
            discount: row.discount,
            image: row.image,
            description: row.description,
            bullets: row.bullets,
            category: row.category,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListProductsQuery {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateProductRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    old_price: Option<Decimal>,
    #[serde(default)]
    discount: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    bullets: Vec<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    stock: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductEnvelope {
    message: String,
    product: ProductResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/products — catalog listing with optional filters.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let filters = ProductListFilters {
        category: query.category.as_deref(),
        q: query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()),
        limit: Some(limit),
    };

    let rows = dukaan_db::list_products(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/{doc_id} — single product lookup.
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(doc_id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    if !DocId::is_valid(&doc_id) {
        return Err(ApiError::bad_request(format!("Invalid productId: {doc_id}")));
    }

    let row = dukaan_db::get_product_by_doc_id(&state.pool, &doc_id)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(row)))
}

/// POST /api/products — add a catalog product (admin).
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Product title missing"))?;
    let price = body
        .price
        .ok_or_else(|| ApiError::bad_request("Product price missing"))?;
    if price < Decimal::ZERO {
        return Err(ApiError::bad_request("Product price must not be negative"));
    }
    let image = body
        .image
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .ok_or_else(|| ApiError::bad_request("Product image missing"))?;

    let doc_id = DocId::generate();
    let new = NewProduct {
        doc_id: doc_id.as_str(),
        title,
        price,
        old_price: body.old_price,
        discount: body.discount.as_deref(),
        image,
        description: body.description.as_deref(),
        bullets: &body.bullets,
        category: body.category.as_deref().unwrap_or("general"),
        stock: body.stock.unwrap_or(1).max(0),
    };

    let row = dukaan_db::create_product(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;
    tracing::info!(doc_id = %row.doc_id.trim(), title = %row.title, "product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            message: "Product created".to_owned(),
            product: ProductResponse::from(row),
        }),
    ))
}
