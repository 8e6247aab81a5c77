//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the (joined) database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//! - A filter struct for list queries where the entity supports filtering

pub mod equipment;
pub mod material;
pub mod material_transaction;
pub mod product;
pub mod production_order;
pub mod quality;
pub mod session;
pub mod user;
