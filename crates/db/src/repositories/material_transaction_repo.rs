//! Repository for the `material_transactions` stock ledger.
//!
//! The ledger is append-only. [`MaterialTransactionRepo::record`] is the single
//! write path for both the ledger and `materials.current_stock`.

use mes_core::error::CoreError;
use mes_core::inventory::{self, TransactionDirection};
use mes_core::pagination::PageRequest;
use mes_core::types::DbId;
use mes_core::validation::validate_non_negative_amount;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::material_transaction::{
    CreateMaterialTransaction, MaterialTransaction, TransactionFilter,
};
use crate::models::production_order::ProductionOrder;
use crate::soft_delete::{self, LIVE};

const COLUMNS: &str = "t.id, t.material_id, m.code AS material_code, m.name AS material_name, \
                       t.direction, t.quantity, t.price, t.total_amount, t.supplier, \
                       t.production_order_id, t.remark, t.operator_id, \
                       u.username AS operator_name, t.created_at";

const FROM: &str = "material_transactions t
                    JOIN materials m ON m.id = t.material_id
                    JOIN users u ON u.id = t.operator_id";

/// Filter predicate bound at `$1` (material_id) and `$2` (direction).
const FILTER: &str = "($1::BIGINT IS NULL OR t.material_id = $1)
                      AND ($2::TEXT IS NULL OR t.direction = $2)";

/// Stock ledger operations.
pub struct MaterialTransactionRepo;

impl MaterialTransactionRepo {
    /// Record a stock movement and apply it to the material's stock level.
    ///
    /// Runs in one transaction holding a row lock on the material, so
    /// concurrent movements on the same material are applied one at a time
    /// against the latest stock. Every early return drops the transaction
    /// uncommitted, leaving neither the ledger row nor the stock change behind.
    pub async fn record(
        pool: &PgPool,
        input: &CreateMaterialTransaction,
        operator_id: DbId,
    ) -> Result<MaterialTransaction, DbError> {
        let direction = TransactionDirection::parse(&input.direction)?;
        inventory::validate_quantity(input.quantity)?;
        validate_non_negative_amount("price", input.price)?;

        let mut tx = pool.begin().await?;

        let lock_query = format!(
            "SELECT current_stock, min_stock FROM materials WHERE id = $1 AND {LIVE} FOR UPDATE"
        );
        let (current_stock, min_stock): (i32, i32) = sqlx::query_as(&lock_query)
            .bind(input.material_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Material",
                id: input.material_id,
            })?;

        if let Some(order_id) = input.production_order_id {
            if !soft_delete::exists::<ProductionOrder, _>(&mut *tx, order_id).await? {
                return Err(CoreError::NotFound {
                    entity: "ProductionOrder",
                    id: order_id,
                }
                .into());
            }
        }

        let new_stock =
            inventory::apply_movement(input.material_id, current_stock, direction, input.quantity)?;
        let total_amount = inventory::total_amount(input.quantity, input.price);

        let (entry_id,): (DbId,) = sqlx::query_as(
            "INSERT INTO material_transactions
                (material_id, direction, quantity, price, total_amount, supplier,
                 production_order_id, remark, operator_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, ''), $9)
             RETURNING id",
        )
        .bind(input.material_id)
        .bind(direction.as_str())
        .bind(input.quantity)
        .bind(input.price)
        .bind(total_amount)
        .bind(&input.supplier)
        .bind(input.production_order_id)
        .bind(&input.remark)
        .bind(operator_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE materials SET current_stock = $2 WHERE id = $1")
            .bind(input.material_id)
            .bind(new_stock)
            .execute(&mut *tx)
            .await?;

        let entry_query = format!("SELECT {COLUMNS} FROM {FROM} WHERE t.id = $1");
        let entry = sqlx::query_as::<_, MaterialTransaction>(&entry_query)
            .bind(entry_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            entry_id,
            material_id = input.material_id,
            direction = direction.as_str(),
            quantity = input.quantity,
            stock_before = current_stock,
            stock_after = new_stock,
            operator_id,
            "Stock movement recorded"
        );
        if direction == TransactionDirection::Out && inventory::is_low_stock(new_stock, min_stock) {
            tracing::warn!(
                material_id = input.material_id,
                current_stock = new_stock,
                min_stock,
                "Material at or below minimum stock"
            );
        }

        Ok(entry)
    }

    /// Find a single ledger entry.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MaterialTransaction>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE t.id = $1");
        sqlx::query_as::<_, MaterialTransaction>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List ledger entries, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Vec<MaterialTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {FILTER}
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, MaterialTransaction>(&query)
            .bind(filter.material_id)
            .bind(&filter.direction)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &TransactionFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM material_transactions t WHERE {FILTER}");
        let row: (i64,) = sqlx::query_as(&query)
            .bind(filter.material_id)
            .bind(&filter.direction)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Every movement for one material in recording order, for reconciliation.
    pub async fn movements_for_material(
        pool: &PgPool,
        material_id: DbId,
    ) -> Result<Vec<(TransactionDirection, i32)>, DbError> {
        let rows: Vec<(String, i32)> = sqlx::query_as(
            "SELECT direction, quantity FROM material_transactions
             WHERE material_id = $1
             ORDER BY id",
        )
        .bind(material_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|(direction, quantity)| {
                Ok((TransactionDirection::parse(&direction)?, quantity))
            })
            .collect()
    }
}
