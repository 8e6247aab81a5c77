//! Handlers for equipment, maintenance records and the upcoming-maintenance view.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use mes_core::equipment::{
    upcoming_window, validate_equipment_status, validate_maintenance_type,
    validate_maintenance_window, EquipmentSummary,
};
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use mes_core::validation::{require_non_empty, validate_code, validate_non_negative_amount};
use mes_db::models::equipment::{
    CreateEquipment, CreateMaintenanceRecord, Equipment, EquipmentFilter, MaintenanceFilter,
    MaintenanceRecord, UpdateEquipment, UpdateMaintenanceRecord,
};
use mes_db::models::user::User;
use mes_db::repositories::{EquipmentRepo, MaintenanceRecordRepo};
use mes_db::soft_delete;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EquipmentListParams {
    pub equipment_type: Option<String>,
    pub status: Option<String>,
    /// Matches code, name, or location.
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceListParams {
    pub equipment_id: Option<DbId>,
    pub maintainer_id: Option<DbId>,
    pub maintenance_type: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    /// Look-ahead in days; defaults to a week.
    pub days: Option<i64>,
}

fn equipment_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Equipment",
        id,
    })
}

fn record_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "MaintenanceRecord",
        id,
    })
}

async fn ensure_code_free(state: &AppState, code: &str, exclude: Option<DbId>) -> AppResult<()> {
    if EquipmentRepo::code_exists(&state.pool, code, exclude).await? {
        return Err(CoreError::Conflict(format!("Equipment code '{code}' already exists")).into());
    }
    Ok(())
}

async fn ensure_equipment_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if !soft_delete::exists::<Equipment, _>(&state.pool, id).await? {
        return Err(equipment_not_found(id));
    }
    Ok(())
}

async fn ensure_maintainer_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if !soft_delete::exists::<User, _>(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: "User", id }.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// POST /api/v1/equipment
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<DataResponse<Equipment>>)> {
    validate_code("code", &input.code)?;
    require_non_empty("name", &input.name)?;
    require_non_empty("equipment_type", &input.equipment_type)?;
    validate_equipment_status(&input.status)?;
    ensure_code_free(&state, &input.code, None).await?;

    let equipment = EquipmentRepo::create(&state.pool, &input).await?;
    tracing::info!(equipment_id = equipment.id, code = %equipment.code, user_id = user.user_id, "Equipment created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: equipment })))
}

/// GET /api/v1/equipment
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<EquipmentListParams>,
) -> AppResult<Json<PaginatedResponse<Equipment>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let status = non_empty(params.status);
    if let Some(status) = &status {
        validate_equipment_status(status)?;
    }
    let filter = EquipmentFilter {
        equipment_type: non_empty(params.equipment_type),
        status,
        keyword: non_empty(params.keyword),
    };
    tracing::debug!(?filter, page = page.page, "Listing equipment");

    let equipment = EquipmentRepo::list(&state.pool, &filter, &page).await?;
    let total = EquipmentRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(equipment, total, page)))
}

/// GET /api/v1/equipment/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Equipment>>> {
    let equipment = EquipmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| equipment_not_found(id))?;
    Ok(Json(DataResponse { data: equipment }))
}

/// PUT /api/v1/equipment/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEquipment>,
) -> AppResult<Json<DataResponse<Equipment>>> {
    ensure_equipment_exists(&state, id).await?;
    if let Some(code) = &input.code {
        validate_code("code", code)?;
        ensure_code_free(&state, code, Some(id)).await?;
    }
    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    if let Some(status) = &input.status {
        validate_equipment_status(status)?;
    }

    let equipment = EquipmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| equipment_not_found(id))?;
    if input.status.is_some() {
        tracing::info!(equipment_id = id, status = %equipment.status, user_id = user.user_id, "Equipment status set");
    }
    Ok(Json(DataResponse { data: equipment }))
}

/// DELETE /api/v1/equipment/{id}
///
/// Rejected with 409 while maintenance records reference the equipment.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    EquipmentRepo::delete(&state.pool, id).await?;
    tracing::info!(equipment_id = id, user_id = user.user_id, "Equipment deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/equipment/types
pub async fn types(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let types = EquipmentRepo::list_types(&state.pool).await?;
    Ok(Json(DataResponse { data: types }))
}

/// GET /api/v1/equipment/statistics
pub async fn statistics(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<EquipmentSummary>>> {
    let counts = EquipmentRepo::status_counts(&state.pool).await?;
    let summary =
        EquipmentSummary::from_status_counts(counts.iter().map(|(s, n)| (s.as_str(), *n)));
    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Maintenance records
// ---------------------------------------------------------------------------

/// POST /api/v1/equipment/maintenance
///
/// The maintainer defaults to the caller.
pub async fn create_maintenance(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateMaintenanceRecord>,
) -> AppResult<(StatusCode, Json<DataResponse<MaintenanceRecord>>)> {
    validate_maintenance_type(&input.maintenance_type)?;
    validate_maintenance_window(input.start_time, input.end_time)?;
    validate_non_negative_amount("cost", input.cost.unwrap_or(0.0))?;
    let maintainer_id = input.maintainer_id.unwrap_or(user.user_id);
    ensure_maintainer_exists(&state, maintainer_id).await?;

    let record = MaintenanceRecordRepo::create(&state.pool, &input, maintainer_id).await?;
    tracing::info!(
        record_id = record.id,
        equipment_id = record.equipment_id,
        maintenance_type = %record.maintenance_type,
        "Maintenance recorded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// GET /api/v1/equipment/maintenance
pub async fn list_maintenance(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<MaintenanceListParams>,
) -> AppResult<Json<PaginatedResponse<MaintenanceRecord>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let filter = MaintenanceFilter {
        equipment_id: params.equipment_id,
        maintainer_id: params.maintainer_id,
        maintenance_type: non_empty(params.maintenance_type),
    };

    let records = MaintenanceRecordRepo::list(&state.pool, &filter, &page).await?;
    let total = MaintenanceRecordRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(records, total, page)))
}

/// GET /api/v1/equipment/maintenance/{id}
pub async fn get_maintenance(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaintenanceRecord>>> {
    let record = MaintenanceRecordRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| record_not_found(id))?;
    Ok(Json(DataResponse { data: record }))
}

/// PUT /api/v1/equipment/maintenance/{id}
pub async fn update_maintenance(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaintenanceRecord>,
) -> AppResult<Json<DataResponse<MaintenanceRecord>>> {
    let existing = MaintenanceRecordRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| record_not_found(id))?;

    if let Some(maintenance_type) = &input.maintenance_type {
        validate_maintenance_type(maintenance_type)?;
    }
    validate_maintenance_window(
        input.start_time.unwrap_or(existing.start_time),
        input.end_time.or(existing.end_time),
    )?;
    if let Some(cost) = input.cost {
        validate_non_negative_amount("cost", cost)?;
    }
    if let Some(equipment_id) = input.equipment_id {
        ensure_equipment_exists(&state, equipment_id).await?;
    }
    if let Some(maintainer_id) = input.maintainer_id {
        ensure_maintainer_exists(&state, maintainer_id).await?;
    }

    let record = MaintenanceRecordRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| record_not_found(id))?;
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/equipment/maintenance/{id}
pub async fn delete_maintenance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !soft_delete::soft_delete::<MaintenanceRecord, _>(&state.pool, id).await? {
        return Err(record_not_found(id));
    }
    tracing::info!(record_id = id, user_id = user.user_id, "Maintenance record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/equipment/upcoming-maintenance
///
/// Records whose next maintenance falls between now and `days` from now.
pub async fn upcoming_maintenance(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<UpcomingParams>,
) -> AppResult<Json<DataResponse<Vec<MaintenanceRecord>>>> {
    let until = Utc::now() + upcoming_window(params.days);
    let records = MaintenanceRecordRepo::upcoming(&state.pool, until).await?;
    Ok(Json(DataResponse { data: records }))
}
