//! Inventory ledger rules.
//!
//! A material's `current_stock` is never written directly: every change is a
//! ledger entry (an `in` or `out` movement) and the new stock level is computed
//! here from the locked current value. The persistence layer applies the result
//! inside the same transaction as the ledger insert.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

pub const DIRECTION_IN: &str = "in";
pub const DIRECTION_OUT: &str = "out";

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    In,
    Out,
}

impl TransactionDirection {
    /// Parse the wire/database representation (`"in"` / `"out"`).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            DIRECTION_IN => Ok(Self::In),
            DIRECTION_OUT => Ok(Self::Out),
            other => Err(CoreError::Validation(format!(
                "Invalid transaction type '{other}'. Must be one of: in, out"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => DIRECTION_IN,
            Self::Out => DIRECTION_OUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement arithmetic
// ---------------------------------------------------------------------------

/// Reject a non-positive movement quantity.
pub fn validate_quantity(quantity: i32) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(
            "Quantity must be a positive integer".into(),
        ));
    }
    Ok(())
}

/// Compute the stock level after applying one movement.
///
/// `current` must be the value read under the row lock. An `out` larger than
/// `current` fails with [`CoreError::InsufficientStock`].
pub fn apply_movement(
    material_id: DbId,
    current: i32,
    direction: TransactionDirection,
    quantity: i32,
) -> Result<i32, CoreError> {
    validate_quantity(quantity)?;
    match direction {
        TransactionDirection::In => current.checked_add(quantity).ok_or_else(|| {
            CoreError::Validation(format!(
                "Stock-in of {quantity} would overflow the stock counter"
            ))
        }),
        TransactionDirection::Out => {
            if quantity > current {
                return Err(CoreError::InsufficientStock {
                    material_id,
                    requested: quantity,
                    available: current,
                });
            }
            Ok(current - quantity)
        }
    }
}

/// Monetary value of a movement: `quantity * unit_price`.
pub fn total_amount(quantity: i32, unit_price: f64) -> f64 {
    f64::from(quantity) * unit_price
}

/// Replay a sequence of movements from zero.
///
/// The result must equal the material's stored `current_stock`.
pub fn ledger_balance<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (TransactionDirection, i32)>,
{
    movements
        .into_iter()
        .map(|(direction, quantity)| match direction {
            TransactionDirection::In => i64::from(quantity),
            TransactionDirection::Out => -i64::from(quantity),
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Material master data
// ---------------------------------------------------------------------------

/// Validate stock thresholds: both non-negative, `max_stock > min_stock`.
pub fn validate_stock_bounds(min_stock: i32, max_stock: i32) -> Result<(), CoreError> {
    if min_stock < 0 || max_stock < 0 {
        return Err(CoreError::Validation(
            "Stock thresholds must not be negative".into(),
        ));
    }
    if max_stock <= min_stock {
        return Err(CoreError::Validation(
            "Maximum stock must be greater than minimum stock".into(),
        ));
    }
    Ok(())
}

/// Validate the descriptive fields of a material.
pub fn validate_material_fields(
    code: &str,
    name: &str,
    unit: &str,
    price: f64,
) -> Result<(), CoreError> {
    crate::catalog::validate_item_fields(code, name, unit, price)
}

/// A material is low on stock when it sits at or below its minimum.
pub fn is_low_stock(current_stock: i32, min_stock: i32) -> bool {
    current_stock <= min_stock
}
