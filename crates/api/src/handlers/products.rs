//! Handlers for the `/products` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mes_core::catalog::validate_item_fields;
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use mes_db::models::product::{CreateProduct, Product, ProductFilter, UpdateProduct};
use mes_db::repositories::ProductRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// Query parameters for `GET /products`.
#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Product",
        id,
    })
}

async fn ensure_code_free(state: &AppState, code: &str, exclude: Option<DbId>) -> AppResult<()> {
    if ProductRepo::code_exists(&state.pool, code, exclude).await? {
        return Err(CoreError::Conflict(format!("Product code '{code}' already exists")).into());
    }
    Ok(())
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    validate_item_fields(&input.code, &input.name, &input.unit, input.price.unwrap_or(0.0))?;
    ensure_code_free(&state, &input.code, None).await?;

    let product = ProductRepo::create(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, code = %product.code, user_id = user.user_id, "Product created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let filter = ProductFilter {
        keyword: non_empty(params.keyword),
        is_active: params.is_active,
    };
    tracing::debug!(?filter, page = page.page, "Listing products");

    let products = ProductRepo::list(&state.pool, &filter, &page).await?;
    let total = ProductRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(products, total, page)))
}

/// GET /api/v1/products/all
///
/// Active products for selection lists, unpaginated.
pub async fn list_all(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let products = ProductRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: product }))
}

/// PUT /api/v1/products/{id}
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    let existing = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    validate_item_fields(
        input.code.as_deref().unwrap_or(&existing.code),
        input.name.as_deref().unwrap_or(&existing.name),
        input.unit.as_deref().unwrap_or(&existing.unit),
        input.price.unwrap_or(existing.price),
    )?;
    if let Some(code) = &input.code {
        ensure_code_free(&state, code, Some(id)).await?;
    }

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/products/{id}
///
/// Rejected with 409 while live production orders reference the product.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ProductRepo::delete(&state.pool, id).await?;
    tracing::info!(product_id = id, user_id = user.user_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
