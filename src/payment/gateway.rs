use crate::model::{BuyerId, OrderId, PaymentRef};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// What the processor is asked to collect. The buyer gets a prompt on their phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub amount: Decimal,
}

/// One poll's view of a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Paid { reference: PaymentRef },
    Failed(String),
    Pending,
    /// The processor has no record of the charge.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network or processor hiccup. Worth asking again.
    #[error("transient gateway error: {0}")]
    Transient(String),
    /// The processor refused the request outright.
    #[error("gateway rejected request: {0}")]
    Rejected(String),
}

/// The mobile-money processor, seen as a request/poll channel.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Starts a charge and returns the processor's reference for it.
    async fn initiate(&self, request: &ChargeRequest) -> Result<PaymentRef, GatewayError>;

    /// Asks once for the charge's current outcome.
    async fn poll_once(&self, reference: &PaymentRef) -> Result<PollOutcome, GatewayError>;
}
