use super::GatewayError;
use crate::model::OrderId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The charge could not be started. The order has been moved to `PaymentFailed`.
    #[error("Could not start payment for order {order_id}: {source}")]
    Initiation {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },

    /// A polling session for this order is already running.
    #[error("Payment for order {0} is already being watched")]
    AlreadyWatching(OrderId),

    /// The coordinator is shutting down and takes no new work.
    #[error("Payment coordinator is shut down")]
    ShutDown,
}
