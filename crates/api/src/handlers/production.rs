//! Handlers for the `/production/orders` resource.
//!
//! Status transitions, progress reporting and order numbering are enforced in
//! `ProductionOrderRepo`; handlers only shape requests and responses.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::production::OrderStatus;
use mes_core::types::DbId;
use mes_db::models::production_order::{
    CreateProductionOrder, OrderFilter, ProductionOrder, ProductionStatistics,
    UpdateProductionOrder,
};
use mes_db::repositories::ProductionOrderRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::non_empty;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// Query parameters for `GET /production/orders`.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    /// Substring of the order number.
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// POST /api/v1/production/orders
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProductionOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductionOrder>>)> {
    let order = ProductionOrderRepo::create(&state.pool, &input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// GET /api/v1/production/orders
///
/// Highest priority first, then newest.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<PaginatedResponse<ProductionOrder>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let status = non_empty(params.status)
        .map(|s| OrderStatus::parse(&s).map(|s| s.as_str().to_string()))
        .transpose()?;
    let filter = OrderFilter {
        status,
        keyword: non_empty(params.keyword),
    };
    tracing::debug!(?filter, page = page.page, "Listing production orders");

    let orders = ProductionOrderRepo::list(&state.pool, &filter, &page).await?;
    let total = ProductionOrderRepo::count(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(orders, total, page)))
}

/// GET /api/v1/production/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductionOrder>>> {
    let order = ProductionOrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ProductionOrder",
            id,
        })?;
    Ok(Json(DataResponse { data: order }))
}

/// PUT /api/v1/production/orders/{id}
///
/// Accepts quantity, schedule and priority edits, an explicit status change,
/// or a `produced` progress report.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProductionOrder>,
) -> AppResult<Json<DataResponse<ProductionOrder>>> {
    let order = ProductionOrderRepo::update(&state.pool, id, &input).await?;
    tracing::debug!(order_id = id, user_id = user.user_id, "Production order update applied");
    Ok(Json(DataResponse { data: order }))
}

/// DELETE /api/v1/production/orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    tracing::debug!(order_id = id, user_id = user.user_id, "Deleting production order");
    ProductionOrderRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/production/statistics
pub async fn statistics(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<ProductionStatistics>>> {
    let stats = ProductionOrderRepo::statistics(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}
