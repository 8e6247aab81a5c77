//! Production order lifecycle rules.
//!
//! An order moves through `pending -> processing -> completed`, may be
//! cancelled from either non-terminal state, and a cancelled order has a
//! reopen edge back to `pending`. Status is normally derived from the reported
//! produced quantity; an explicit status change must follow the transition
//! table. Completed and cancelled orders are locked against further updates.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Priority assigned when the caller leaves it unset (or sends zero).
pub const DEFAULT_PRIORITY: i32 = 3;

pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 5;

/// Prefix of every generated order number.
pub const ORDER_NUMBER_PREFIX: &str = "PO";

/// Largest per-day sequence that fits the four-digit suffix.
pub const MAX_DAILY_SEQUENCE: i32 = 9999;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Invalid order status '{other}'. Must be one of: pending, processing, completed, cancelled"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled orders reject every update.
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` by an explicit status change.
pub fn valid_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
        OrderStatus::Processing => &[OrderStatus::Completed, OrderStatus::Cancelled],
        OrderStatus::Completed => &[],
        OrderStatus::Cancelled => &[OrderStatus::Pending],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Status implied by progress: nothing produced is `pending`, partial is
/// `processing`, the full quantity is `completed`.
pub fn derive_status(produced: i32, quantity: i32) -> OrderStatus {
    if produced <= 0 {
        OrderStatus::Pending
    } else if produced < quantity {
        OrderStatus::Processing
    } else {
        OrderStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

pub fn validate_order_quantity(quantity: i32) -> Result<(), CoreError> {
    if quantity < 1 {
        return Err(CoreError::Validation(
            "Quantity must be at least 1".into(),
        ));
    }
    Ok(())
}

pub fn validate_priority(priority: i32) -> Result<(), CoreError> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(CoreError::Validation(format!(
            "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}"
        )));
    }
    Ok(())
}

/// Apply the default to an unset or zero priority, then range-check it.
pub fn resolve_priority(priority: Option<i32>) -> Result<i32, CoreError> {
    match priority {
        None | Some(0) => Ok(DEFAULT_PRIORITY),
        Some(p) => {
            validate_priority(p)?;
            Ok(p)
        }
    }
}

/// The planned end must not precede the planned start.
pub fn validate_schedule(
    start_date: Option<Timestamp>,
    end_date: Option<Timestamp>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(CoreError::Validation(
                "End date must not be before start date".into(),
            ));
        }
    }
    Ok(())
}

/// Format `PO{YYYYMMDD}{seq:04}`.
pub fn format_order_number(day: NaiveDate, sequence: i32) -> Result<String, CoreError> {
    if !(1..=MAX_DAILY_SEQUENCE).contains(&sequence) {
        return Err(CoreError::Conflict(format!(
            "Daily order number sequence exhausted for {day}"
        )));
    }
    Ok(format!(
        "{ORDER_NUMBER_PREFIX}{}{sequence:04}",
        day.format("%Y%m%d")
    ))
}

// ---------------------------------------------------------------------------
// Update planning
// ---------------------------------------------------------------------------

/// The stored fields of an order an update is checked against.
#[derive(Debug, Clone, Copy)]
pub struct OrderState {
    pub id: DbId,
    pub status: OrderStatus,
    pub quantity: i32,
    pub produced: i32,
}

/// Requested changes to an order's progress fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressChange {
    pub quantity: Option<i32>,
    pub produced: Option<i32>,
    pub status: Option<OrderStatus>,
    pub priority: Option<i32>,
}

/// Resulting progress fields after a successful update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedProgress {
    pub quantity: i32,
    pub produced: i32,
    pub status: OrderStatus,
}

/// Check an update against the current order and compute its outcome.
///
/// When `produced` is supplied the derived status is applied and any explicit
/// `status` in the same change is ignored. An explicit status alone must be a
/// legal transition from the stored status. The returned `produced` never
/// exceeds the returned `quantity`.
pub fn plan_progress(
    current: &OrderState,
    change: &ProgressChange,
) -> Result<PlannedProgress, CoreError> {
    if current.status.is_locked() {
        return Err(CoreError::OrderLocked {
            id: current.id,
            status: current.status.as_str().to_string(),
        });
    }

    if let Some(quantity) = change.quantity {
        validate_order_quantity(quantity)?;
    }
    if let Some(priority) = change.priority {
        validate_priority(priority)?;
    }

    let quantity = change.quantity.unwrap_or(current.quantity);

    if let Some(produced) = change.produced {
        if produced < 0 {
            return Err(CoreError::Validation(
                "Produced quantity must not be negative".into(),
            ));
        }
        if produced > quantity {
            return Err(CoreError::OverProduction { produced, quantity });
        }
        return Ok(PlannedProgress {
            quantity,
            produced,
            status: derive_status(produced, quantity),
        });
    }

    if current.produced > quantity {
        return Err(CoreError::OverProduction {
            produced: current.produced,
            quantity,
        });
    }

    let status = match change.status {
        Some(target) => {
            validate_transition(current.status, target)?;
            target
        }
        None => current.status,
    };

    Ok(PlannedProgress {
        quantity,
        produced: current.produced,
        status,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn order(status: OrderStatus, quantity: i32, produced: i32) -> OrderState {
        OrderState {
            id: 1,
            status,
            quantity,
            produced,
        }
    }

    // -- transition table ----------------------------------------------------

    #[test]
    fn pending_transitions() {
        assert!(can_transition(OrderStatus::Pending, OrderStatus::Processing));
        assert!(can_transition(OrderStatus::Pending, OrderStatus::Cancelled));
        assert!(!can_transition(OrderStatus::Pending, OrderStatus::Completed));
    }

    #[test]
    fn processing_transitions() {
        assert!(can_transition(OrderStatus::Processing, OrderStatus::Completed));
        assert!(can_transition(OrderStatus::Processing, OrderStatus::Cancelled));
        assert!(!can_transition(OrderStatus::Processing, OrderStatus::Pending));
    }

    #[test]
    fn completed_has_no_transitions() {
        assert!(valid_transitions(OrderStatus::Completed).is_empty());
    }

    #[test]
    fn cancelled_reopens_to_pending_only() {
        assert_eq!(
            valid_transitions(OrderStatus::Cancelled),
            &[OrderStatus::Pending]
        );
    }

    #[test]
    fn self_transition_is_invalid() {
        for status in OrderStatus::ALL {
            assert!(!can_transition(status, status), "{status} -> {status}");
        }
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = validate_transition(OrderStatus::Completed, OrderStatus::Processing)
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition { ref from, ref to }
                if from == "completed" && to == "processing"
        );
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert_matches!(OrderStatus::parse("done"), Err(CoreError::Validation(_)));
    }

    // -- derived status ------------------------------------------------------

    #[test]
    fn derive_status_from_progress() {
        assert_eq!(derive_status(0, 100), OrderStatus::Pending);
        assert_eq!(derive_status(40, 100), OrderStatus::Processing);
        assert_eq!(derive_status(100, 100), OrderStatus::Completed);
    }

    // -- priority / schedule / numbering ------------------------------------

    #[test]
    fn priority_defaults_to_three() {
        assert_eq!(resolve_priority(None).unwrap(), 3);
        assert_eq!(resolve_priority(Some(0)).unwrap(), 3);
        assert_eq!(resolve_priority(Some(5)).unwrap(), 5);
        assert_matches!(resolve_priority(Some(6)), Err(CoreError::Validation(_)));
        assert_matches!(resolve_priority(Some(-1)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn schedule_end_before_start_rejected() {
        let now = Utc::now();
        assert!(validate_schedule(Some(now), Some(now + Duration::days(1))).is_ok());
        assert!(validate_schedule(Some(now), None).is_ok());
        assert!(validate_schedule(Some(now), Some(now - Duration::hours(1))).is_err());
    }

    #[test]
    fn order_number_format() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(format_order_number(day, 1).unwrap(), "PO202610190001");
        assert_eq!(format_order_number(day, 42).unwrap(), "PO202610190042");
        assert_matches!(format_order_number(day, 10_000), Err(CoreError::Conflict(_)));
    }

    // -- plan_progress -------------------------------------------------------

    #[test]
    fn reporting_progress_moves_to_processing() {
        let planned = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                produced: Some(40),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(planned.status, OrderStatus::Processing);
        assert_eq!(planned.produced, 40);
    }

    #[test]
    fn reporting_full_quantity_completes() {
        let planned = plan_progress(
            &order(OrderStatus::Processing, 100, 40),
            &ProgressChange {
                produced: Some(100),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(planned.status, OrderStatus::Completed);
    }

    #[test]
    fn locked_orders_reject_updates() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            let result = plan_progress(
                &order(status, 100, 100),
                &ProgressChange {
                    produced: Some(50),
                    ..Default::default()
                },
            );
            assert_matches!(result, Err(CoreError::OrderLocked { id: 1, .. }));
        }
    }

    #[test]
    fn over_production_rejected() {
        let result = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                produced: Some(101),
                ..Default::default()
            },
        );
        assert_matches!(
            result,
            Err(CoreError::OverProduction {
                produced: 101,
                quantity: 100
            })
        );
    }

    #[test]
    fn produced_checked_against_new_quantity() {
        let change = ProgressChange {
            quantity: Some(50),
            produced: Some(50),
            ..Default::default()
        };
        let planned = plan_progress(&order(OrderStatus::Processing, 100, 10), &change).unwrap();
        assert_eq!(planned.quantity, 50);
        assert_eq!(planned.status, OrderStatus::Completed);
    }

    #[test]
    fn shrinking_quantity_below_produced_rejected() {
        let result = plan_progress(
            &order(OrderStatus::Processing, 100, 60),
            &ProgressChange {
                quantity: Some(50),
                ..Default::default()
            },
        );
        assert_matches!(result, Err(CoreError::OverProduction { .. }));
    }

    #[test]
    fn explicit_status_follows_table() {
        let planned = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(planned.status, OrderStatus::Cancelled);

        let result = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                status: Some(OrderStatus::Completed),
                ..Default::default()
            },
        );
        assert_matches!(result, Err(CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn derived_status_wins_over_explicit() {
        let planned = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                produced: Some(100),
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(planned.status, OrderStatus::Completed);
    }

    #[test]
    fn invalid_priority_rejected() {
        let result = plan_progress(
            &order(OrderStatus::Pending, 100, 0),
            &ProgressChange {
                priority: Some(9),
                ..Default::default()
            },
        );
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn produced_never_exceeds_quantity_in_plan() {
        for quantity in 1..=20 {
            for produced in 0..=25 {
                let change = ProgressChange {
                    produced: Some(produced),
                    ..Default::default()
                };
                if let Ok(planned) = plan_progress(&order(OrderStatus::Pending, quantity, 0), &change)
                {
                    assert!(planned.produced <= planned.quantity);
                    if planned.produced == planned.quantity {
                        assert_eq!(planned.status, OrderStatus::Completed);
                    }
                }
            }
        }
    }
}
