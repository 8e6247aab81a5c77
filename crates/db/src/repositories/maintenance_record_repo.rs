//! Repository for the `maintenance_records` table.
//!
//! Every returned record has its `duration_minutes` populated.

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::equipment::{
    CreateMaintenanceRecord, Equipment, MaintenanceFilter, MaintenanceRecord,
    UpdateMaintenanceRecord,
};
use crate::soft_delete::{self, live, RowLock, LIVE};

const COLUMNS: &str = "r.id, r.equipment_id, e.code AS equipment_code, e.name AS equipment_name, \
                       r.maintainer_id, u.username AS maintainer_name, r.maintenance_type, \
                       r.description, r.start_time, r.end_time, r.cost, r.parts_replaced, \
                       r.result, r.next_maintenance, r.remark, r.created_at, r.updated_at";

const FROM: &str = "maintenance_records r
                    JOIN equipment e ON e.id = r.equipment_id
                    JOIN users u ON u.id = r.maintainer_id";

/// Filter predicate bound at `$1` (equipment), `$2` (maintainer), `$3` (type).
const FILTER: &str = "($1::BIGINT IS NULL OR r.equipment_id = $1)
                      AND ($2::BIGINT IS NULL OR r.maintainer_id = $2)
                      AND ($3::TEXT IS NULL OR r.maintenance_type = $3)";

/// Provides CRUD and scheduling queries for maintenance records.
pub struct MaintenanceRecordRepo;

impl MaintenanceRecordRepo {
    /// Log maintenance performed by `maintainer_id`.
    ///
    /// Holds a share lock on the equipment row until commit.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMaintenanceRecord,
        maintainer_id: DbId,
    ) -> Result<MaintenanceRecord, DbError> {
        let equipment_id = input.equipment_id;
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<Equipment, _>(&mut *tx, equipment_id, RowLock::Share).await? {
            return Err(CoreError::NotFound {
                entity: "Equipment",
                id: equipment_id,
            }
            .into());
        }

        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO maintenance_records
                (equipment_id, maintainer_id, maintenance_type, description, start_time,
                 end_time, cost, parts_replaced, result, next_maintenance, remark)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), COALESCE($8, ''),
                     COALESCE($9, ''), $10, COALESCE($11, ''))
             RETURNING id",
        )
        .bind(input.equipment_id)
        .bind(maintainer_id)
        .bind(&input.maintenance_type)
        .bind(&input.description)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.cost)
        .bind(&input.parts_replaced)
        .bind(&input.result)
        .bind(input.next_maintenance)
        .bind(&input.remark)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let record = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(record)
    }

    /// Find a record by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MaintenanceRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE r.id = $1 AND {}", live("r"));
        let record = sqlx::query_as::<_, MaintenanceRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(record.map(MaintenanceRecord::with_duration))
    }

    /// List records, most recent start first.
    pub async fn list(
        pool: &PgPool,
        filter: &MaintenanceFilter,
        page: &PageRequest,
    ) -> Result<Vec<MaintenanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {} AND {FILTER}
             ORDER BY r.start_time DESC, r.id DESC
             LIMIT $4 OFFSET $5",
            live("r")
        );
        let records = sqlx::query_as::<_, MaintenanceRecord>(&query)
            .bind(filter.equipment_id)
            .bind(filter.maintainer_id)
            .bind(&filter.maintenance_type)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(records.into_iter().map(MaintenanceRecord::with_duration).collect())
    }

    pub async fn count(pool: &PgPool, filter: &MaintenanceFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM maintenance_records r WHERE {} AND {FILTER}",
            live("r")
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(filter.equipment_id)
            .bind(filter.maintainer_id)
            .bind(&filter.maintenance_type)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update a record. Only non-`None` fields in `input` are applied.
    ///
    /// The caller validates the merged time window before calling.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaintenanceRecord,
    ) -> Result<Option<MaintenanceRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE maintenance_records SET
                equipment_id = COALESCE($2, equipment_id),
                maintainer_id = COALESCE($3, maintainer_id),
                maintenance_type = COALESCE($4, maintenance_type),
                description = COALESCE($5, description),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                cost = COALESCE($8, cost),
                parts_replaced = COALESCE($9, parts_replaced),
                result = COALESCE($10, result),
                next_maintenance = COALESCE($11, next_maintenance),
                remark = COALESCE($12, remark)
             WHERE id = $1 AND {LIVE}"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(input.equipment_id)
            .bind(input.maintainer_id)
            .bind(&input.maintenance_type)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.cost)
            .bind(&input.parts_replaced)
            .bind(&input.result)
            .bind(input.next_maintenance)
            .bind(&input.remark)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Records whose next maintenance falls between now and `until`, soonest first.
    ///
    /// Only records on live equipment are returned.
    pub async fn upcoming(
        pool: &PgPool,
        until: Timestamp,
    ) -> Result<Vec<MaintenanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {} AND {}
               AND r.next_maintenance IS NOT NULL
               AND r.next_maintenance BETWEEN NOW() AND $1
             ORDER BY r.next_maintenance, r.id",
            live("r"),
            live("e")
        );
        let records = sqlx::query_as::<_, MaintenanceRecord>(&query)
            .bind(until)
            .fetch_all(pool)
            .await?;
        Ok(records.into_iter().map(MaintenanceRecord::with_duration).collect())
    }
}
