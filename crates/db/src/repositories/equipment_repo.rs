//! Repository for the `equipment` table.

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::equipment::{CreateEquipment, Equipment, EquipmentFilter, UpdateEquipment};
use crate::soft_delete::{self, RowLock, LIVE};

const COLUMNS: &str = "id, code, name, equipment_type, model, manufacturer, location, status, \
                       purchase_date, warranty_date, description, created_at, updated_at";

/// Filter predicate bound at `$1` (equipment_type), `$2` (status), `$3` (keyword).
const FILTER: &str = "($1::TEXT IS NULL OR equipment_type = $1)
                      AND ($2::TEXT IS NULL OR status = $2)
                      AND ($3::TEXT IS NULL
                           OR code ILIKE '%' || $3 || '%'
                           OR name ILIKE '%' || $3 || '%'
                           OR location ILIKE '%' || $3 || '%')";

/// Provides CRUD operations for equipment.
pub struct EquipmentRepo;

impl EquipmentRepo {
    pub async fn create(pool: &PgPool, input: &CreateEquipment) -> Result<Equipment, sqlx::Error> {
        let query = format!(
            "INSERT INTO equipment
                (code, name, equipment_type, model, manufacturer, location, status,
                 purchase_date, warranty_date, description)
             VALUES ($1, $2, $3, COALESCE($4, ''), COALESCE($5, ''), COALESCE($6, ''), $7,
                     $8, $9, COALESCE($10, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.equipment_type)
            .bind(&input.model)
            .bind(&input.manufacturer)
            .bind(&input.location)
            .bind(&input.status)
            .bind(input.purchase_date)
            .bind(input.warranty_date)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find equipment by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE id = $1 AND {LIVE}");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether other live equipment already uses `code`.
    pub async fn code_exists(
        pool: &PgPool,
        code: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (
                SELECT 1 FROM equipment
                WHERE code = $1 AND {LIVE} AND ($2::BIGINT IS NULL OR id <> $2)
             )"
        );
        let row: (bool,) = sqlx::query_as(&query)
            .bind(code)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &EquipmentFilter,
        page: &PageRequest,
    ) -> Result<Vec<Equipment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment
             WHERE {LIVE} AND {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(&filter.equipment_type)
            .bind(&filter.status)
            .bind(&filter.keyword)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &EquipmentFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM equipment WHERE {LIVE} AND {FILTER}");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(&filter.equipment_type)
            .bind(&filter.status)
            .bind(&filter.keyword)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update equipment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEquipment,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!(
            "UPDATE equipment SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                equipment_type = COALESCE($4, equipment_type),
                model = COALESCE($5, model),
                manufacturer = COALESCE($6, manufacturer),
                location = COALESCE($7, location),
                status = COALESCE($8, status),
                purchase_date = COALESCE($9, purchase_date),
                warranty_date = COALESCE($10, warranty_date),
                description = COALESCE($11, description)
             WHERE id = $1 AND {LIVE}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.equipment_type)
            .bind(&input.model)
            .bind(&input.manufacturer)
            .bind(&input.location)
            .bind(&input.status)
            .bind(input.purchase_date)
            .bind(input.warranty_date)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Number of live maintenance records for the equipment.
    pub async fn count_maintenance<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query =
            format!("SELECT COUNT(*) FROM maintenance_records WHERE equipment_id = $1 AND {LIVE}");
        let row: (i64,) = sqlx::query_as(&query).bind(id).fetch_one(executor).await?;
        Ok(row.0)
    }

    /// Soft-delete equipment with no live maintenance records.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<Equipment, _>(&mut *tx, id, RowLock::Update).await? {
            return Err(CoreError::NotFound { entity: "Equipment", id }.into());
        }

        let records = Self::count_maintenance(&mut *tx, id).await?;
        if records > 0 {
            return Err(CoreError::Conflict(format!(
                "Equipment has {records} maintenance record(s) and cannot be deleted"
            ))
            .into());
        }

        soft_delete::soft_delete::<Equipment, _>(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Live equipment count per status.
    pub async fn status_counts(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        let query = format!(
            "SELECT status, COUNT(*)::BIGINT FROM equipment WHERE {LIVE} GROUP BY status"
        );
        sqlx::query_as(&query).fetch_all(pool).await
    }

    /// Distinct equipment types in use, alphabetically.
    pub async fn list_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT equipment_type FROM equipment
             WHERE {LIVE} AND equipment_type <> ''
             ORDER BY equipment_type"
        );
        let rows: Vec<(String,)> = sqlx::query_as(&query).fetch_all(pool).await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
