//! Repository for the `production_orders` table.
//!
//! Creation, progress updates, and deletion run in transactions holding a row
//! lock on the order so the status machine is checked against the state that
//! is actually written.

use chrono::Utc;
use mes_core::error::CoreError;
use mes_core::pagination::PageRequest;
use mes_core::production::{self, OrderState, OrderStatus, ProgressChange};
use mes_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::product::Product;
use crate::models::production_order::{
    CreateProductionOrder, OrderFilter, ProductionOrder, ProductionStatistics, StatusCount,
    TodayStats, TrendPoint, UpdateProductionOrder,
};
use crate::soft_delete::{self, live, RowLock, LIVE};

const COLUMNS: &str = "o.id, o.order_no, o.product_id, p.code AS product_code, \
                       p.name AS product_name, o.quantity, o.produced, o.status, o.priority, \
                       o.start_date, o.end_date, o.created_by, u.username AS creator_name, \
                       o.created_at, o.updated_at";

const FROM: &str = "production_orders o
                    JOIN products p ON p.id = o.product_id
                    JOIN users u ON u.id = o.created_by";

/// Filter predicate bound at `$1` (status) and `$2` (order number keyword).
const FILTER: &str = "($1::TEXT IS NULL OR o.status = $1)
                      AND ($2::TEXT IS NULL OR o.order_no ILIKE '%' || $2 || '%')";

/// Locked snapshot of the fields an update or delete is validated against.
#[derive(sqlx::FromRow)]
struct LockedOrder {
    status: String,
    quantity: i32,
    produced: i32,
    start_date: Option<Timestamp>,
    end_date: Option<Timestamp>,
}

/// Production order operations.
pub struct ProductionOrderRepo;

impl ProductionOrderRepo {
    /// Create an order in `pending` with a fresh `PO{YYYYMMDD}{seq}` number.
    ///
    /// The daily sequence comes from an upsert on `order_number_counters`
    /// inside the same transaction, so concurrent creations on one day never
    /// receive the same number. The product row stays share-locked until
    /// commit so it cannot be deleted underneath the new order.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProductionOrder,
        created_by: DbId,
    ) -> Result<ProductionOrder, DbError> {
        production::validate_order_quantity(input.quantity)?;
        let priority = production::resolve_priority(input.priority)?;
        production::validate_schedule(input.start_date, input.end_date)?;

        let mut tx = pool.begin().await?;

        let product_live =
            soft_delete::lock_live::<Product, _>(&mut *tx, input.product_id, RowLock::Share)
                .await?;
        if !product_live {
            return Err(CoreError::NotFound {
                entity: "Product",
                id: input.product_id,
            }
            .into());
        }

        let day = Utc::now().date_naive();
        let (sequence,): (i32,) = sqlx::query_as(
            "INSERT INTO order_number_counters (day, last_seq)
             VALUES ($1, 1)
             ON CONFLICT (day) DO UPDATE
                SET last_seq = order_number_counters.last_seq + 1
             RETURNING last_seq",
        )
        .bind(day)
        .fetch_one(&mut *tx)
        .await?;
        let order_no = production::format_order_number(day, sequence)?;

        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO production_orders
                (order_no, product_id, quantity, produced, status, priority,
                 start_date, end_date, created_by)
             VALUES ($1, $2, $3, 0, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(&order_no)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(OrderStatus::Pending.as_str())
        .bind(priority)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let order = fetch_joined(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(order_id = id, order_no = %order_no, created_by, "Production order created");
        Ok(order)
    }

    /// Find an order by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE o.id = $1 AND {}", live("o"));
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List orders by priority, then newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<Vec<ProductionOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             WHERE {} AND {FILTER}
             ORDER BY o.priority DESC, o.created_at DESC, o.id DESC
             LIMIT $3 OFFSET $4",
            live("o")
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(&filter.status)
            .bind(&filter.keyword)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &OrderFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM production_orders o WHERE {} AND {FILTER}",
            live("o")
        );
        let row: (i64,) = sqlx::query_as(&query)
            .bind(&filter.status)
            .bind(&filter.keyword)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Apply an update to an order's progress, priority, or schedule.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProductionOrder,
    ) -> Result<ProductionOrder, DbError> {
        let requested_status = input
            .status
            .as_deref()
            .map(OrderStatus::parse)
            .transpose()?;

        let mut tx = pool.begin().await?;
        let locked = lock_order(&mut *tx, id).await?;

        let current = OrderState {
            id,
            status: OrderStatus::parse(&locked.status)?,
            quantity: locked.quantity,
            produced: locked.produced,
        };
        let change = ProgressChange {
            quantity: input.quantity,
            produced: input.produced,
            status: requested_status,
            priority: input.priority,
        };
        let planned = production::plan_progress(&current, &change)?;

        let start_date = input.start_date.or(locked.start_date);
        let end_date = input.end_date.or(locked.end_date);
        production::validate_schedule(start_date, end_date)?;

        sqlx::query(
            "UPDATE production_orders SET
                quantity = $2,
                produced = $3,
                status = $4,
                priority = COALESCE($5, priority),
                start_date = $6,
                end_date = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(planned.quantity)
        .bind(planned.produced)
        .bind(planned.status.as_str())
        .bind(input.priority)
        .bind(start_date)
        .bind(end_date)
        .execute(&mut *tx)
        .await?;

        let order = fetch_joined(&mut *tx, id).await?;
        tx.commit().await?;

        if planned.status != current.status {
            tracing::info!(
                order_id = id,
                from = %current.status,
                to = %planned.status,
                produced = planned.produced,
                "Production order status changed"
            );
        }
        Ok(order)
    }

    /// Soft-delete an order. Orders in `processing` cannot be deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        let locked = lock_order(&mut *tx, id).await?;

        if OrderStatus::parse(&locked.status)? == OrderStatus::Processing {
            return Err(CoreError::OrderInProgress { id }.into());
        }

        soft_delete::soft_delete::<ProductionOrder, _>(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(order_id = id, "Production order deleted");
        Ok(())
    }

    /// Dashboard aggregates over live orders.
    pub async fn statistics(pool: &PgPool) -> Result<ProductionStatistics, sqlx::Error> {
        let status_query = format!(
            "SELECT status, COUNT(*)::BIGINT AS count
             FROM production_orders
             WHERE {LIVE}
             GROUP BY status
             ORDER BY status"
        );
        let status_stats = sqlx::query_as::<_, StatusCount>(&status_query)
            .fetch_all(pool)
            .await?;

        let today_query = format!(
            "SELECT
                COUNT(*) FILTER (WHERE created_at::DATE = CURRENT_DATE)::BIGINT AS total_orders,
                COUNT(*) FILTER (
                    WHERE status = 'completed' AND updated_at::DATE = CURRENT_DATE
                )::BIGINT AS completed_orders,
                COALESCE(SUM(produced) FILTER (WHERE updated_at::DATE = CURRENT_DATE), 0)::BIGINT
                    AS total_produced
             FROM production_orders
             WHERE {LIVE}"
        );
        let today_stats = sqlx::query_as::<_, TodayStats>(&today_query)
            .fetch_one(pool)
            .await?;

        let trend_query = format!(
            "SELECT
                updated_at::DATE AS date,
                COALESCE(SUM(produced), 0)::BIGINT AS produced,
                COUNT(*) FILTER (WHERE status = 'completed')::BIGINT AS completed
             FROM production_orders
             WHERE {LIVE}
               AND updated_at >= date_trunc('month', NOW())
             GROUP BY updated_at::DATE
             ORDER BY date"
        );
        let monthly_trend = sqlx::query_as::<_, TrendPoint>(&trend_query)
            .fetch_all(pool)
            .await?;

        Ok(ProductionStatistics {
            status_stats,
            today_stats,
            monthly_trend,
        })
    }
}

async fn lock_order(conn: &mut PgConnection, id: DbId) -> Result<LockedOrder, DbError> {
    let query = format!(
        "SELECT status, quantity, produced, start_date, end_date
         FROM production_orders
         WHERE id = $1 AND {LIVE}
         FOR UPDATE"
    );
    let order = sqlx::query_as::<_, LockedOrder>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    order.ok_or_else(|| {
        CoreError::NotFound {
            entity: "ProductionOrder",
            id,
        }
        .into()
    })
}

async fn fetch_joined(conn: &mut PgConnection, id: DbId) -> Result<ProductionOrder, sqlx::Error> {
    let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE o.id = $1");
    sqlx::query_as::<_, ProductionOrder>(&query)
        .bind(id)
        .fetch_one(conn)
        .await
}
