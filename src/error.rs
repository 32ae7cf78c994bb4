use crate::codes::DecodeError;
use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::model::{CodeKind, OrderId};
use crate::order_actor::OrderError;
use crate::payment::PaymentError;
use thiserror::Error;

/// Every failure a [`FulfillmentService`](crate::service::FulfillmentService) operation can
/// return. None of them is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Unreadable code: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The same payload was just submitted for this order.
    #[error("Duplicate scan ignored")]
    DuplicateScan,

    /// The code cannot be shown: not minted yet, or already used.
    #[error("No {kind} code to show for order {order_id}")]
    CodeUnavailable { order_id: OrderId, kind: CodeKind },

    /// An actor or background task stopped unexpectedly.
    #[error("Runtime failure: {0}")]
    Runtime(String),
}

impl FulfillmentError {
    /// Whether the caller can usefully try again right away (re-scan, re-type, resend).
    pub fn is_retryable(&self) -> bool {
        match self {
            FulfillmentError::Decode(_) | FulfillmentError::DuplicateScan => true,
            FulfillmentError::Order(OrderError::CodeMismatch)
            | FulfillmentError::Order(OrderError::ActorCommunicationError(_))
            | FulfillmentError::Ledger(LedgerError::ActorCommunicationError(_)) => true,
            _ => false,
        }
    }
}
