use crate::model::{EscrowEntry, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Custom actions for vendor accounts.
#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Puts an order's funds in escrow. Repeating it with the same amount changes nothing.
    Hold { order_id: OrderId, amount: Decimal },
    /// Moves an order's funds from held to available, at most once.
    Release { order_id: OrderId },
    /// Reads one order's escrow entry.
    Entry { order_id: OrderId },
}

/// Results from LedgerActions - variants match 1:1 with LedgerAction
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerActionResult {
    Hold(HoldOutcome),
    Release(ReleaseOutcome),
    Entry(Option<EscrowEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldOutcome {
    Held,
    AlreadyHeld,
}

/// Outcome of a release. Either way the funds end up available exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseOutcome {
    Released { amount: Decimal },
    AlreadyReleased,
}
