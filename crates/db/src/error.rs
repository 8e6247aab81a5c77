//! Error type for repository operations that enforce domain rules mid-transaction.
//!
//! Plain CRUD methods return `sqlx::Error` directly. Methods that lock a row,
//! consult a rule in `mes_core`, and then write (stock movements, order
//! progress, guarded deletes) return [`DbError`] so the rule violation reaches
//! the caller intact after the transaction has been rolled back.

use mes_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
