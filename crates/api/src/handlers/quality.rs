//! Handlers for quality standards, inspections and inspection statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::quality::{validate_result, validate_value_range, InspectionSummary};
use mes_core::types::{DbId, Timestamp};
use mes_core::validation::require_non_empty;
use mes_db::models::product::Product;
use mes_db::models::production_order::ProductionOrder;
use mes_db::models::quality::{
    CreateQualityInspection, CreateQualityStandard, InspectionFilter, InspectionStatsFilter,
    QualityInspection, QualityStandard, StandardFilter, UpdateQualityInspection,
    UpdateQualityStandard,
};
use mes_db::models::user::User;
use mes_db::repositories::{QualityInspectionRepo, QualityStandardRepo};
use mes_db::soft_delete::{self, SoftDeletable};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StandardListParams {
    pub product_id: Option<DbId>,
    pub standard_type: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InspectionListParams {
    pub production_order_id: Option<DbId>,
    pub quality_standard_id: Option<DbId>,
    pub inspector_id: Option<DbId>,
    pub result: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query parameters for `GET /quality/statistics`. All bounds are optional.
#[derive(Debug, Deserialize)]
pub struct StatisticsParams {
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub production_order_id: Option<DbId>,
    pub quality_standard_id: Option<DbId>,
}

/// Fail with `NotFound` unless a live `T` with this id exists.
async fn ensure_exists<T: SoftDeletable>(state: &AppState, id: DbId) -> AppResult<()> {
    if !soft_delete::exists::<T, _>(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: T::ENTITY,
            id,
        }
        .into());
    }
    Ok(())
}

fn standard_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "QualityStandard",
        id,
    })
}

fn inspection_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "QualityInspection",
        id,
    })
}

async fn ensure_name_free(
    state: &AppState,
    product_id: DbId,
    name: &str,
    exclude: Option<DbId>,
) -> AppResult<()> {
    if QualityStandardRepo::name_exists(&state.pool, product_id, name, exclude).await? {
        return Err(CoreError::Conflict(format!(
            "Quality standard '{name}' already exists for this product"
        ))
        .into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Standards
// ---------------------------------------------------------------------------

/// POST /api/v1/quality/standards
pub async fn create_standard(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateQualityStandard>,
) -> AppResult<(StatusCode, Json<DataResponse<QualityStandard>>)> {
    require_non_empty("name", &input.name)?;
    require_non_empty("standard_type", &input.standard_type)?;
    validate_value_range(input.min_value, input.max_value, input.target_value)?;
    ensure_exists::<Product>(&state, input.product_id).await?;
    ensure_name_free(&state, input.product_id, &input.name, None).await?;

    let standard = QualityStandardRepo::create(&state.pool, &input).await?;
    tracing::info!(
        standard_id = standard.id,
        product_id = standard.product_id,
        user_id = user.user_id,
        "Quality standard created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: standard })))
}

/// GET /api/v1/quality/standards
pub async fn list_standards(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<StandardListParams>,
) -> AppResult<Json<PaginatedResponse<QualityStandard>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let filter = StandardFilter {
        product_id: params.product_id,
        standard_type: non_empty(params.standard_type),
        is_active: params.is_active,
    };

    let standards = QualityStandardRepo::list(&state.pool, &filter, &page).await?;
    let total = QualityStandardRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(standards, total, page)))
}

/// GET /api/v1/quality/standards/{id}
pub async fn get_standard(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QualityStandard>>> {
    let standard = QualityStandardRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| standard_not_found(id))?;
    Ok(Json(DataResponse { data: standard }))
}

/// PUT /api/v1/quality/standards/{id}
///
/// The value range is checked on the merged result, so a partial update
/// cannot leave the target outside the limits.
pub async fn update_standard(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateQualityStandard>,
) -> AppResult<Json<DataResponse<QualityStandard>>> {
    let existing = QualityStandardRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| standard_not_found(id))?;

    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    if let Some(standard_type) = &input.standard_type {
        require_non_empty("standard_type", standard_type)?;
    }
    validate_value_range(
        input.min_value.unwrap_or(existing.min_value),
        input.max_value.unwrap_or(existing.max_value),
        input.target_value.unwrap_or(existing.target_value),
    )?;
    if let Some(product_id) = input.product_id {
        ensure_exists::<Product>(&state, product_id).await?;
    }
    if input.product_id.is_some() || input.name.is_some() {
        let product_id = input.product_id.unwrap_or(existing.product_id);
        let name = input.name.as_deref().unwrap_or(&existing.name);
        ensure_name_free(&state, product_id, name, Some(id)).await?;
    }

    let standard = QualityStandardRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| standard_not_found(id))?;
    Ok(Json(DataResponse { data: standard }))
}

/// DELETE /api/v1/quality/standards/{id}
pub async fn delete_standard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    QualityStandardRepo::delete(&state.pool, id).await?;
    tracing::info!(standard_id = id, user_id = user.user_id, "Quality standard deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/quality/standards/types
pub async fn standard_types(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let types = QualityStandardRepo::list_types(&state.pool).await?;
    Ok(Json(DataResponse { data: types }))
}

// ---------------------------------------------------------------------------
// Inspections
// ---------------------------------------------------------------------------

/// POST /api/v1/quality/inspections
///
/// The inspector defaults to the caller.
pub async fn create_inspection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateQualityInspection>,
) -> AppResult<(StatusCode, Json<DataResponse<QualityInspection>>)> {
    validate_result(&input.result)?;
    let inspector_id = input.inspector_id.unwrap_or(user.user_id);
    ensure_exists::<ProductionOrder>(&state, input.production_order_id).await?;
    ensure_exists::<User>(&state, inspector_id).await?;

    let inspection = QualityInspectionRepo::create(&state.pool, &input, inspector_id).await?;
    tracing::info!(
        inspection_id = inspection.id,
        order_id = inspection.production_order_id,
        result = %inspection.result,
        "Quality inspection recorded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: inspection })))
}

/// GET /api/v1/quality/inspections
pub async fn list_inspections(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<InspectionListParams>,
) -> AppResult<Json<PaginatedResponse<QualityInspection>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let result = non_empty(params.result);
    if let Some(result) = &result {
        validate_result(result)?;
    }
    let filter = InspectionFilter {
        production_order_id: params.production_order_id,
        quality_standard_id: params.quality_standard_id,
        inspector_id: params.inspector_id,
        result,
    };

    let inspections = QualityInspectionRepo::list(&state.pool, &filter, &page).await?;
    let total = QualityInspectionRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(inspections, total, page)))
}

/// GET /api/v1/quality/inspections/{id}
pub async fn get_inspection(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QualityInspection>>> {
    let inspection = QualityInspectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| inspection_not_found(id))?;
    Ok(Json(DataResponse { data: inspection }))
}

/// PUT /api/v1/quality/inspections/{id}
pub async fn update_inspection(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateQualityInspection>,
) -> AppResult<Json<DataResponse<QualityInspection>>> {
    ensure_exists::<QualityInspection>(&state, id).await?;
    if let Some(result) = &input.result {
        validate_result(result)?;
    }
    if let Some(order_id) = input.production_order_id {
        ensure_exists::<ProductionOrder>(&state, order_id).await?;
    }
    if let Some(standard_id) = input.quality_standard_id {
        ensure_exists::<QualityStandard>(&state, standard_id).await?;
    }
    if let Some(inspector_id) = input.inspector_id {
        ensure_exists::<User>(&state, inspector_id).await?;
    }

    let inspection = QualityInspectionRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| inspection_not_found(id))?;
    Ok(Json(DataResponse { data: inspection }))
}

/// DELETE /api/v1/quality/inspections/{id}
pub async fn delete_inspection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !soft_delete::soft_delete::<QualityInspection, _>(&state.pool, id).await? {
        return Err(inspection_not_found(id));
    }
    tracing::info!(inspection_id = id, user_id = user.user_id, "Quality inspection deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/quality/statistics
pub async fn statistics(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<StatisticsParams>,
) -> AppResult<Json<DataResponse<InspectionSummary>>> {
    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if end < start {
            return Err(AppError::BadRequest(
                "end_date must not be before start_date".into(),
            ));
        }
    }
    let filter = InspectionStatsFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        production_order_id: params.production_order_id,
        quality_standard_id: params.quality_standard_id,
    };

    let (passed, failed) = QualityInspectionRepo::result_counts(&state.pool, &filter).await?;
    Ok(Json(DataResponse {
        data: InspectionSummary::from_counts(passed, failed),
    }))
}
