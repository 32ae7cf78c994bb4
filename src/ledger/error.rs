use crate::model::{OrderId, VendorId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during escrow operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// No escrow was ever held for this order.
    #[error("No escrow held for order {0}")]
    UnknownEscrow(OrderId),

    /// The order is already held with a different amount.
    #[error("Escrow for order {order_id} is {held}, refusing to hold {requested}")]
    AmountMismatch {
        order_id: OrderId,
        held: Decimal,
        requested: Decimal,
    },

    /// The order is already held under a different vendor.
    #[error("Escrow for order {order_id} belongs to vendor {held_by}")]
    VendorMismatch { order_id: OrderId, held_by: VendorId },

    #[error("Escrow amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// The requested vendor account was not found.
    #[error("Vendor account not found: {0}")]
    NotFound(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
