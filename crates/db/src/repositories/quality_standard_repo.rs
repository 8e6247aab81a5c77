//! Repository for the `quality_standards` table.

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::error::DbError;

use crate::models::quality::{
    CreateQualityStandard, QualityStandard, StandardFilter, UpdateQualityStandard,
};
use crate::soft_delete::{self, live, RowLock, LIVE};

const COLUMNS: &str = "s.id, s.product_id, p.code AS product_code, p.name AS product_name, \
                       s.name, s.standard_type, s.min_value, s.max_value, s.target_value, \
                       s.unit, s.description, s.is_active, s.created_at, s.updated_at";

const FROM: &str = "quality_standards s JOIN products p ON p.id = s.product_id";

/// Filter predicate bound at `$1` (product_id), `$2` (standard_type), `$3` (is_active).
const FILTER: &str = "($1::BIGINT IS NULL OR s.product_id = $1)
                      AND ($2::TEXT IS NULL OR s.standard_type = $2)
                      AND ($3::BOOLEAN IS NULL OR s.is_active = $3)";

/// Provides CRUD operations for quality standards.
pub struct QualityStandardRepo;

impl QualityStandardRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateQualityStandard,
    ) -> Result<QualityStandard, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO quality_standards
                (product_id, name, standard_type, min_value, max_value, target_value,
                 unit, description, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, ''), COALESCE($8, ''),
                     COALESCE($9, true))
             RETURNING id",
        )
        .bind(input.product_id)
        .bind(&input.name)
        .bind(&input.standard_type)
        .bind(input.min_value)
        .bind(input.max_value)
        .bind(input.target_value)
        .bind(&input.unit)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a standard by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<QualityStandard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE s.id = $1 AND {}", live("s"));
        sqlx::query_as::<_, QualityStandard>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the product already has another live standard named `name`.
    pub async fn name_exists(
        pool: &PgPool,
        product_id: DbId,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (
                SELECT 1 FROM quality_standards
                WHERE product_id = $1 AND name = $2 AND {LIVE}
                  AND ($3::BIGINT IS NULL OR id <> $3)
             )"
        );
        let row: (bool,) = sqlx::query_as(&query)
            .bind(product_id)
            .bind(name)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &StandardFilter,
        page: &PageRequest,
    ) -> Result<Vec<QualityStandard>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {} AND {FILTER}
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT $4 OFFSET $5",
            live("s")
        );
        sqlx::query_as::<_, QualityStandard>(&query)
            .bind(filter.product_id)
            .bind(&filter.standard_type)
            .bind(filter.is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &StandardFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM quality_standards s WHERE {} AND {FILTER}",
            live("s")
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(filter.product_id)
            .bind(&filter.standard_type)
            .bind(filter.is_active)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update a standard. Only non-`None` fields in `input` are applied.
    ///
    /// The caller validates the merged value range before calling.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateQualityStandard,
    ) -> Result<Option<QualityStandard>, sqlx::Error> {
        let query = format!(
            "UPDATE quality_standards SET
                product_id = COALESCE($2, product_id),
                name = COALESCE($3, name),
                standard_type = COALESCE($4, standard_type),
                min_value = COALESCE($5, min_value),
                max_value = COALESCE($6, max_value),
                target_value = COALESCE($7, target_value),
                unit = COALESCE($8, unit),
                description = COALESCE($9, description),
                is_active = COALESCE($10, is_active)
             WHERE id = $1 AND {LIVE}"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(input.product_id)
            .bind(&input.name)
            .bind(&input.standard_type)
            .bind(input.min_value)
            .bind(input.max_value)
            .bind(input.target_value)
            .bind(&input.unit)
            .bind(&input.description)
            .bind(input.is_active)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Number of live inspections measured against the standard.
    pub async fn count_inspections<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM quality_inspections WHERE quality_standard_id = $1 AND {LIVE}"
        );
        let row: (i64,) = sqlx::query_as(&query).bind(id).fetch_one(executor).await?;
        Ok(row.0)
    }

    /// Soft-delete a standard that no live inspection was measured against.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<QualityStandard, _>(&mut *tx, id, RowLock::Update).await? {
            return Err(CoreError::NotFound {
                entity: "QualityStandard",
                id,
            }
            .into());
        }

        let inspections = Self::count_inspections(&mut *tx, id).await?;
        if inspections > 0 {
            return Err(CoreError::Conflict(format!(
                "Quality standard is referenced by {inspections} inspection(s)"
            ))
            .into());
        }

        soft_delete::soft_delete::<QualityStandard, _>(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Distinct standard types in use, alphabetically.
    pub async fn list_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT standard_type FROM quality_standards
             WHERE {LIVE} AND standard_type <> ''
             ORDER BY standard_type"
        );
        let rows: Vec<(String,)> = sqlx::query_as(&query).fetch_all(pool).await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
