//! Error types for the Order actor.

use crate::model::{CodeKind, OrderStatus, PaymentRef, ScannerRole};
use thiserror::Error;

/// Rejections raised by the order state machine, plus the runtime failures of reaching it.
///
/// Every rejection leaves the order exactly as it was.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    /// The event is not allowed from the current state.
    #[error("Cannot apply '{event}' to an order in {from}")]
    InvalidTransition { from: OrderStatus, event: &'static str },

    /// The scanned code does not belong to this order or to the current handoff.
    #[error("Code does not match this order's current handoff")]
    CodeMismatch,

    /// The scanned code was already used.
    #[error("The {0} code was already used")]
    CodeAlreadyConsumed(CodeKind),

    /// The code is valid for this handoff, but the scanner's role may not confirm it.
    #[error("A {role} may not confirm the {kind} handoff")]
    UnauthorizedScanner { role: ScannerRole, kind: CodeKind },

    /// The scanned code is older than the validity window.
    #[error("The {0} code has expired")]
    CodeExpired(CodeKind),

    /// The payment confirmation refers to a different charge than the pending one.
    #[error("Payment reference {0} does not match the pending attempt")]
    PaymentReferenceMismatch(PaymentRef),

    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunicationError(msg)
    }
}
