//! Repository for the `materials` table.
//!
//! Stock levels are read here but only written by
//! [`MaterialTransactionRepo::record`](super::MaterialTransactionRepo::record).

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::material::{CreateMaterial, Material, MaterialFilter, UpdateMaterial};
use crate::soft_delete::{self, RowLock, LIVE};

pub(crate) const COLUMNS: &str = "id, code, name, material_type, unit, price, min_stock, \
                                  max_stock, current_stock, description, is_active, \
                                  created_at, updated_at";

/// Filter predicate bound at `$1` (material_type) and `$2` (keyword).
const FILTER: &str = "($1::TEXT IS NULL OR material_type = $1)
                      AND ($2::TEXT IS NULL OR code ILIKE '%' || $2 || '%' OR name ILIKE '%' || $2 || '%')";

/// Provides CRUD operations for materials.
pub struct MaterialRepo;

impl MaterialRepo {
    /// Insert a new material with zero stock.
    pub async fn create(pool: &PgPool, input: &CreateMaterial) -> Result<Material, sqlx::Error> {
        let query = format!(
            "INSERT INTO materials
                (code, name, material_type, unit, price, min_stock, max_stock, description)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6, $7, COALESCE($8, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.material_type)
            .bind(&input.unit)
            .bind(input.price)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a material by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM materials WHERE id = $1 AND {LIVE}");
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether another live material already uses `code`.
    pub async fn code_exists(
        pool: &PgPool,
        code: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (
                SELECT 1 FROM materials
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

    /// List materials, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &MaterialFilter,
        page: &PageRequest,
    ) -> Result<Vec<Material>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM materials
             WHERE {LIVE} AND {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(&filter.material_type)
            .bind(&filter.keyword)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &MaterialFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM materials WHERE {LIVE} AND {FILTER}");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(&filter.material_type)
            .bind(&filter.keyword)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update descriptive fields and thresholds. Never touches `current_stock`.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaterial,
    ) -> Result<Option<Material>, sqlx::Error> {
        let query = format!(
            "UPDATE materials SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                material_type = COALESCE($4, material_type),
                unit = COALESCE($5, unit),
                price = COALESCE($6, price),
                min_stock = COALESCE($7, min_stock),
                max_stock = COALESCE($8, max_stock),
                description = COALESCE($9, description),
                is_active = COALESCE($10, is_active)
             WHERE id = $1 AND {LIVE}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.material_type)
            .bind(&input.unit)
            .bind(input.price)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of ledger entries referencing the material.
    pub async fn count_transactions<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM material_transactions WHERE material_id = $1")
                .bind(id)
                .fetch_one(executor)
                .await?;
        Ok(row.0)
    }

    /// Soft-delete a material that has no ledger entries.
    ///
    /// The material row is locked first, so a concurrent
    /// [`record`](super::MaterialTransactionRepo::record) either commits
    /// before the count or sees the row as deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<Material, _>(&mut *tx, id, RowLock::Update).await? {
            return Err(CoreError::NotFound { entity: "Material", id }.into());
        }

        let entries = Self::count_transactions(&mut *tx, id).await?;
        if entries > 0 {
            return Err(CoreError::Conflict(format!(
                "Material has {entries} stock movement(s) and cannot be deleted"
            ))
            .into());
        }

        soft_delete::soft_delete::<Material, _>(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Live materials at or below their minimum stock, most depleted first.
    pub async fn list_low_stock(pool: &PgPool) -> Result<Vec<Material>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM materials
             WHERE {LIVE} AND current_stock <= min_stock
             ORDER BY (current_stock - min_stock) ASC, code ASC"
        );
        sqlx::query_as::<_, Material>(&query).fetch_all(pool).await
    }

    /// Distinct non-empty material types in use.
    pub async fn list_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT material_type FROM materials
             WHERE {LIVE} AND material_type <> ''
             ORDER BY material_type"
        );
        let rows: Vec<(String,)> = sqlx::query_as(&query).fetch_all(pool).await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
