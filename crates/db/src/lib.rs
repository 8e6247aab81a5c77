//! PostgreSQL persistence for the MES back office.
//!
//! - [`models`] -- row structs and DTOs, one module per aggregate.
//! - [`repositories`] -- zero-sized repositories taking `&PgPool`.
//! - [`soft_delete`] -- the shared `deleted_at` filter and soft-delete statements.

pub mod error;
pub mod models;
pub mod repositories;
pub mod soft_delete;

use sqlx::postgres::PgPoolOptions;

pub use error::DbError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
