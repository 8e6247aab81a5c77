//! Repository for the `products` table.

use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::product::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::soft_delete::{self, RowLock, LIVE};

const COLUMNS: &str =
    "id, code, name, description, unit, price, is_active, created_at, updated_at";

/// Filter predicate bound at `$1` (keyword) and `$2` (is_active).
const FILTER: &str = "($1::TEXT IS NULL OR code ILIKE '%' || $1 || '%' OR name ILIKE '%' || $1 || '%')
                      AND ($2::BOOLEAN IS NULL OR is_active = $2)";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (code, name, description, unit, price, is_active)
             VALUES ($1, $2, COALESCE($3, ''), $4, COALESCE($5, 0), COALESCE($6, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.unit)
            .bind(input.price)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a product by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 AND {LIVE}");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether another live product already uses `code`.
    pub async fn code_exists(
        pool: &PgPool,
        code: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS (
                SELECT 1 FROM products
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

    /// List products, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE {LIVE} AND {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&filter.keyword)
            .bind(filter.is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &ProductFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM products WHERE {LIVE} AND {FILTER}");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(&filter.keyword)
            .bind(filter.is_active)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// All active products ordered by name, for selection lists.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products WHERE {LIVE} AND is_active = true ORDER BY name, id"
        );
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Update a product. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                unit = COALESCE($5, unit),
                price = COALESCE($6, price),
                is_active = COALESCE($7, is_active)
             WHERE id = $1 AND {LIVE}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.unit)
            .bind(input.price)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Number of live production orders referencing the product.
    pub async fn count_orders<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query =
            format!("SELECT COUNT(*) FROM production_orders WHERE product_id = $1 AND {LIVE}");
        let row: (i64,) = sqlx::query_as(&query).bind(id).fetch_one(executor).await?;
        Ok(row.0)
    }

    /// Soft-delete a product no live production order references.
    ///
    /// Order creation holds a share lock on the product row, so the count
    /// here always includes orders created concurrently.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        if !soft_delete::lock_live::<Product, _>(&mut *tx, id, RowLock::Update).await? {
            return Err(CoreError::NotFound { entity: "Product", id }.into());
        }

        let orders = Self::count_orders(&mut *tx, id).await?;
        if orders > 0 {
            return Err(CoreError::Conflict(format!(
                "Product is referenced by {orders} production order(s)"
            ))
            .into());
        }

        soft_delete::soft_delete::<Product, _>(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
