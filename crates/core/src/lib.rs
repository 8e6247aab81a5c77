//! Pure domain rules for the MES back office.
//!
//! Nothing in this crate performs I/O. The persistence and HTTP layers call
//! into these functions to validate input and compute derived values, and
//! surface failures as [`error::CoreError`].

pub mod catalog;
pub mod equipment;
pub mod error;
pub mod inventory;
pub mod pagination;
pub mod production;
pub mod quality;
pub mod roles;
pub mod types;
pub mod validation;
