use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock for material {material_id}: requested {requested}, available {available}")]
    InsufficientStock {
        material_id: DbId,
        requested: i32,
        available: i32,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Production order {id} is {status} and can no longer be modified")]
    OrderLocked { id: DbId, status: String },

    #[error("Produced quantity {produced} exceeds planned quantity {quantity}")]
    OverProduction { produced: i32, quantity: i32 },

    #[error("Production order {id} is in progress and cannot be deleted")]
    OrderInProgress { id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::Validation(err.to_string())
    }
}
