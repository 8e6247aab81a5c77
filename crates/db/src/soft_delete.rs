//! Soft deletion shared by every entity table carrying a `deleted_at` column.
//!
//! Rows are never physically removed through the repositories. Deleting sets
//! `deleted_at = NOW()`, and every read query includes [`LIVE`] (or
//! [`live`] for an aliased table) so deleted rows stay invisible.

use mes_core::types::DbId;
use sqlx::postgres::PgExecutor;

/// Predicate selecting rows that have not been soft-deleted.
pub const LIVE: &str = "deleted_at IS NULL";

/// [`LIVE`] qualified with a table alias, for joined queries.
pub fn live(alias: &str) -> String {
    format!("{alias}.deleted_at IS NULL")
}

/// Marker for a model backed by a soft-deletable table.
pub trait SoftDeletable {
    /// Table name the model's rows live in.
    const TABLE: &'static str;
    /// Entity name used in not-found errors.
    const ENTITY: &'static str;
}

/// Mark a live row deleted. Returns `true` if a row changed.
pub async fn soft_delete<'e, T, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
where
    T: SoftDeletable,
    E: PgExecutor<'e>,
{
    let query = format!(
        "UPDATE {} SET deleted_at = NOW() WHERE id = $1 AND {LIVE}",
        T::TABLE
    );
    let result = sqlx::query(&query).bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

/// Clear the deletion marker on a soft-deleted row. Returns `true` if a row changed.
pub async fn restore<'e, T, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
where
    T: SoftDeletable,
    E: PgExecutor<'e>,
{
    let query = format!(
        "UPDATE {} SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        T::TABLE
    );
    let result = sqlx::query(&query).bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

/// Strength of the row lock taken by [`lock_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// Held by guarded deletes; excludes every other locker.
    Update,
    /// Held while inserting a child row; concurrent inserts share it.
    Share,
}

impl RowLock {
    fn clause(self) -> &'static str {
        match self {
            RowLock::Update => "FOR UPDATE",
            RowLock::Share => "FOR SHARE",
        }
    }
}

/// Lock a live row until the surrounding transaction ends.
///
/// Returns `false` when no live row has this id, including a row that was
/// soft-deleted while this call waited for the lock.
pub async fn lock_live<'e, T, E>(
    executor: E,
    id: DbId,
    lock: RowLock,
) -> Result<bool, sqlx::Error>
where
    T: SoftDeletable,
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT id FROM {} WHERE id = $1 AND {LIVE} {}",
        T::TABLE,
        lock.clause()
    );
    let row: Option<(DbId,)> = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// Whether a live row with this id exists.
pub async fn exists<'e, T, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
where
    T: SoftDeletable,
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND {LIVE})",
        T::TABLE
    );
    let row: (bool,) = sqlx::query_as(&query).bind(id).fetch_one(executor).await?;
    Ok(row.0)
}
