//! Request handlers, one submodule per resource.
//!
//! Handlers extract the caller, validate request shape, delegate to the
//! repositories in `mes_db`, and map errors via [`AppError`](crate::error::AppError).

pub mod equipment;
pub mod materials;
pub mod production;
pub mod products;
pub mod quality;
pub mod users;
