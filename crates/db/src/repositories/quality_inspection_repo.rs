//! Repository for the `quality_inspections` table.

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::quality::{
    CreateQualityInspection, InspectionFilter, InspectionStatsFilter, QualityInspection,
    QualityStandard, UpdateQualityInspection,
};
use crate::soft_delete::{self, live, RowLock, LIVE};

const COLUMNS: &str = "i.id, i.production_order_id, o.order_no AS production_order_no, \
                       i.quality_standard_id, s.name AS quality_standard_name, \
                       i.inspector_id, u.username AS inspector_name, i.actual_value, \
                       s.target_value, s.min_value, s.max_value, s.unit, i.result, i.remark, \
                       i.inspected_at, i.created_at, i.updated_at";

const FROM: &str = "quality_inspections i
                    JOIN production_orders o ON o.id = i.production_order_id
                    JOIN quality_standards s ON s.id = i.quality_standard_id
                    JOIN users u ON u.id = i.inspector_id";

/// Filter predicate bound at `$1` (order), `$2` (standard), `$3` (inspector), `$4` (result).
const FILTER: &str = "($1::BIGINT IS NULL OR i.production_order_id = $1)
                      AND ($2::BIGINT IS NULL OR i.quality_standard_id = $2)
                      AND ($3::BIGINT IS NULL OR i.inspector_id = $3)
                      AND ($4::TEXT IS NULL OR i.result = $4)";

/// Provides CRUD and aggregate queries for quality inspections.
pub struct QualityInspectionRepo;

impl QualityInspectionRepo {
    /// Record an inspection by `inspector_id`.
    ///
    /// The standard is share-locked for the insert, which keeps a concurrent
    /// [`QualityStandardRepo::delete`](super::QualityStandardRepo::delete)
    /// from missing the new inspection.
    pub async fn create(
        pool: &PgPool,
        input: &CreateQualityInspection,
        inspector_id: DbId,
    ) -> Result<QualityInspection, DbError> {
        let standard_id = input.quality_standard_id;
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<QualityStandard, _>(&mut *tx, standard_id, RowLock::Share)
            .await?
        {
            return Err(CoreError::NotFound {
                entity: "QualityStandard",
                id: standard_id,
            }
            .into());
        }

        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO quality_inspections
                (production_order_id, quality_standard_id, inspector_id, actual_value,
                 result, remark, inspected_at)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, ''), COALESCE($7, NOW()))
             RETURNING id",
        )
        .bind(input.production_order_id)
        .bind(input.quality_standard_id)
        .bind(inspector_id)
        .bind(input.actual_value)
        .bind(&input.result)
        .bind(&input.remark)
        .bind(input.inspected_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let inspection = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(inspection)
    }

    /// Find an inspection by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<QualityInspection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE i.id = $1 AND {}", live("i"));
        sqlx::query_as::<_, QualityInspection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List inspections, most recently inspected first.
    pub async fn list(
        pool: &PgPool,
        filter: &InspectionFilter,
        page: &PageRequest,
    ) -> Result<Vec<QualityInspection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {} AND {FILTER}
             ORDER BY i.inspected_at DESC, i.id DESC
             LIMIT $5 OFFSET $6",
            live("i")
        );
        sqlx::query_as::<_, QualityInspection>(&query)
            .bind(filter.production_order_id)
            .bind(filter.quality_standard_id)
            .bind(filter.inspector_id)
            .bind(&filter.result)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &InspectionFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM quality_inspections i WHERE {} AND {FILTER}",
            live("i")
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(filter.production_order_id)
            .bind(filter.quality_standard_id)
            .bind(filter.inspector_id)
            .bind(&filter.result)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update an inspection. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateQualityInspection,
    ) -> Result<Option<QualityInspection>, sqlx::Error> {
        let query = format!(
            "UPDATE quality_inspections SET
                production_order_id = COALESCE($2, production_order_id),
                quality_standard_id = COALESCE($3, quality_standard_id),
                inspector_id = COALESCE($4, inspector_id),
                actual_value = COALESCE($5, actual_value),
                result = COALESCE($6, result),
                remark = COALESCE($7, remark),
                inspected_at = COALESCE($8, inspected_at)
             WHERE id = $1 AND {LIVE}"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(input.production_order_id)
            .bind(input.quality_standard_id)
            .bind(input.inspector_id)
            .bind(input.actual_value)
            .bind(&input.result)
            .bind(&input.remark)
            .bind(input.inspected_at)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Pass and fail counts over live inspections in scope, as `(passed, failed)`.
    pub async fn result_counts(
        pool: &PgPool,
        filter: &InspectionStatsFilter,
    ) -> Result<(i64, i64), sqlx::Error> {
        let query = format!(
            "SELECT
                COUNT(*) FILTER (WHERE result = 'pass')::BIGINT,
                COUNT(*) FILTER (WHERE result = 'fail')::BIGINT
             FROM quality_inspections
             WHERE {LIVE}
               AND ($1::TIMESTAMPTZ IS NULL OR inspected_at >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR inspected_at <= $2)
               AND ($3::BIGINT IS NULL OR production_order_id = $3)
               AND ($4::BIGINT IS NULL OR quality_standard_id = $4)"
        );
        sqlx::query_as(&query)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.production_order_id)
            .bind(filter.quality_standard_id)
            .fetch_one(pool)
            .await
    }
}
