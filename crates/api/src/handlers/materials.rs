//! Handlers for the `/materials` resource and its stock ledger.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mes_core::error::CoreError;
use mes_core::inventory::{validate_material_fields, validate_stock_bounds, TransactionDirection};
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use mes_db::models::material::{CreateMaterial, Material, MaterialFilter, UpdateMaterial};
use mes_db::models::material_transaction::{
    CreateMaterialTransaction, MaterialTransaction, TransactionFilter,
};
use mes_db::repositories::{MaterialRepo, MaterialTransactionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// Query parameters for `GET /materials`.
#[derive(Debug, Deserialize)]
pub struct MaterialListParams {
    pub material_type: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query parameters for `GET /materials/transactions`.
#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub material_id: Option<DbId>,
    /// `in` or `out`.
    pub direction: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Material",
        id,
    })
}

async fn ensure_code_free(state: &AppState, code: &str, exclude: Option<DbId>) -> AppResult<()> {
    if MaterialRepo::code_exists(&state.pool, code, exclude).await? {
        return Err(CoreError::Conflict(format!("Material code '{code}' already exists")).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Master data
// ---------------------------------------------------------------------------

/// POST /api/v1/materials
///
/// New materials start with zero stock; stock only changes through the ledger.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<DataResponse<Material>>)> {
    validate_material_fields(&input.code, &input.name, &input.unit, input.price.unwrap_or(0.0))?;
    validate_stock_bounds(input.min_stock, input.max_stock)?;
    ensure_code_free(&state, &input.code, None).await?;

    let material = MaterialRepo::create(&state.pool, &input).await?;
    tracing::info!(material_id = material.id, code = %material.code, user_id = user.user_id, "Material created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// GET /api/v1/materials
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<MaterialListParams>,
) -> AppResult<Json<PaginatedResponse<Material>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let filter = MaterialFilter {
        material_type: non_empty(params.material_type),
        keyword: non_empty(params.keyword),
    };
    tracing::debug!(?filter, page = page.page, "Listing materials");

    let materials = MaterialRepo::list(&state.pool, &filter, &page).await?;
    let total = MaterialRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(materials, total, page)))
}

/// GET /api/v1/materials/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = MaterialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: material }))
}

/// PUT /api/v1/materials/{id}
///
/// `current_stock` is not updatable here.
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterial>,
) -> AppResult<Json<DataResponse<Material>>> {
    let existing = MaterialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    validate_material_fields(
        input.code.as_deref().unwrap_or(&existing.code),
        input.name.as_deref().unwrap_or(&existing.name),
        input.unit.as_deref().unwrap_or(&existing.unit),
        input.price.unwrap_or(existing.price),
    )?;
    validate_stock_bounds(
        input.min_stock.unwrap_or(existing.min_stock),
        input.max_stock.unwrap_or(existing.max_stock),
    )?;
    if let Some(code) = &input.code {
        ensure_code_free(&state, code, Some(id)).await?;
    }

    let material = MaterialRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: material }))
}

/// DELETE /api/v1/materials/{id}
///
/// Rejected with 409 once the material has ledger entries.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    MaterialRepo::delete(&state.pool, id).await?;
    tracing::info!(material_id = id, user_id = user.user_id, "Material deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/materials/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Material>>>> {
    let materials = MaterialRepo::list_low_stock(&state.pool).await?;
    Ok(Json(DataResponse { data: materials }))
}

/// GET /api/v1/materials/types
pub async fn types(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let types = MaterialRepo::list_types(&state.pool).await?;
    Ok(Json(DataResponse { data: types }))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// POST /api/v1/materials/transactions
///
/// Record an `in` or `out` stock movement as the calling user.
pub async fn record_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateMaterialTransaction>,
) -> AppResult<(StatusCode, Json<DataResponse<MaterialTransaction>>)> {
    let entry = MaterialTransactionRepo::record(&state.pool, &input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /api/v1/materials/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<TransactionListParams>,
) -> AppResult<Json<PaginatedResponse<MaterialTransaction>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let direction = non_empty(params.direction)
        .map(|d| TransactionDirection::parse(&d).map(|d| d.as_str().to_string()))
        .transpose()?;
    let filter = TransactionFilter {
        material_id: params.material_id,
        direction,
    };

    let entries = MaterialTransactionRepo::list(&state.pool, &filter, &page).await?;
    let total = MaterialTransactionRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(entries, total, page)))
}
