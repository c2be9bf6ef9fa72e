//! Order status and the transition rules between statuses.
//!
//! The graph has exactly two sinks (`delivered`, `cancelled`), so every order
//! eventually terminates. Forward skips such as `confirmed -> delivered` or
//! `pending -> shipped` are legal because fulfilment is sometimes recorded
//! after the fact.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Shipped, Cancelled],
            Confirmed => &[Processing, Shipped, Delivered, Cancelled],
            Processing => &[Shipped, Delivered, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Customers may cancel their own order only before fulfilment starts.
    pub fn allows_self_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("unknown order status '{s}'")))
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    from.allowed_next().contains(&to)
}

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    if from == to {
        return Err(AppError::AlreadyInState(from));
    }
    if from.is_terminal() {
        return Err(AppError::TerminalState(from));
    }
    if !can_transition(from, to) {
        return Err(AppError::InvalidTransition {
            from,
            to,
            allowed: from.allowed_next().to_vec(),
        });
    }
    Ok(())
}

/// Human readable list of statuses, used in error messages.
pub fn describe(statuses: &[OrderStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(OrderStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn allowed_sets() {
        assert_eq!(Pending.allowed_next(), &[Confirmed, Shipped, Cancelled]);
        assert_eq!(
            Confirmed.allowed_next(),
            &[Processing, Shipped, Delivered, Cancelled]
        );
        assert_eq!(Processing.allowed_next(), &[Shipped, Delivered, Cancelled]);
        assert_eq!(Shipped.allowed_next(), &[Delivered, Cancelled]);
        assert!(Delivered.allowed_next().is_empty());
        assert!(Cancelled.allowed_next().is_empty());
    }

    #[test]
    fn validate_matches_table_for_every_pair() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = from.allowed_next().contains(&to) && !from.is_terminal() && from != to;
                assert_eq!(
                    validate_transition(from, to).is_ok(),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn same_status_is_already_in_state() {
        for status in OrderStatus::ALL {
            assert!(matches!(
                validate_transition(status, status),
                Err(AppError::AlreadyInState(s)) if s == status
            ));
        }
    }

    #[test]
    fn delivered_and_cancelled_are_sinks() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL.into_iter().filter(|to| *to != from) {
                assert!(matches!(
                    validate_transition(from, to),
                    Err(AppError::TerminalState(s)) if s == from
                ));
            }
        }
    }

    #[test]
    fn pending_cannot_jump_to_delivered() {
        assert!(matches!(
            validate_transition(Pending, Delivered),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(!can_transition(Pending, Processing));
    }

    #[test]
    fn skipping_forward_is_allowed() {
        assert!(validate_transition(Pending, Shipped).is_ok());
        assert!(validate_transition(Confirmed, Delivered).is_ok());
        assert!(validate_transition(Processing, Delivered).is_ok());
    }

    #[test]
    fn backwards_move_names_allowed_set() {
        let err = validate_transition(Shipped, Processing).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, Shipped);
                assert_eq!(to, Processing);
                assert_eq!(allowed, vec![Delivered, Cancelled]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn self_cancel_only_before_processing() {
        let allowed: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::allows_self_cancel)
            .collect();
        assert_eq!(allowed, vec![Pending, Confirmed]);
    }

    #[test]
    fn text_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }
}
