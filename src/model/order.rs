use crate::model::{BuyerId, CodeKind, ConfirmationCode, OrderId, PaymentRef, RiderId, VendorId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    PaymentPending,
    Paid,
    PaymentFailed,
    AwaitingPickup,
    InDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The code a scan is expected to carry in this state, if scanning applies at all.
    pub fn expected_code(self) -> Option<CodeKind> {
        match self {
            OrderStatus::AwaitingPickup => Some(CodeKind::Pickup),
            OrderStatus::InDelivery => Some(CodeKind::Delivery),
            _ => None,
        }
    }

    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Created | OrderStatus::PaymentPending | OrderStatus::PaymentFailed
        )
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One line of the cart as priced by the catalog at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(product_ref: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_ref: product_ref.into(),
            quantity,
            unit_price,
        }
    }
}

/// Why a payment ended without money being captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFailure {
    /// Still pending when the attempt budget ran out.
    Timeout,
    /// The processor has no record of the charge (never completed or voided upstream).
    Voided,
    /// The processor reported a failure, e.g. the payer declined the prompt.
    Declined(String),
    /// The charge request could not be started.
    InitiationFailed(String),
}

impl Display for PaymentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentFailure::Timeout => f.write_str("timeout"),
            PaymentFailure::Voided => f.write_str("voided"),
            PaymentFailure::Declined(reason) => write!(f, "declined: {}", reason),
            PaymentFailure::InitiationFailed(reason) => write!(f, "initiation failed: {}", reason),
        }
    }
}

/// The current (or most recent) polling session against the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub reference: PaymentRef,
    pub started_at: DateTime<Utc>,
    pub polls: u32,
    pub last_polled_at: Option<DateTime<Utc>>,
}

/// Audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

/// Represents a marketplace order moving through fulfillment.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](entity_actor::ActorEntity) trait (see
/// [`crate::order_actor`]), so each order lives in its own actor cell and every transition of a
/// given order is serialized.
///
/// The only way to change `status` is an [`OrderAction`](crate::order_actor::OrderAction)
/// accepted by the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub vendor_id: VendorId,
    pub rider_id: Option<RiderId>,
    pub items: Vec<LineItem>,
    pub amount_total: Decimal,
    pub status: OrderStatus,
    pub pickup_code: Option<ConfirmationCode>,
    pub delivery_code: Option<ConfirmationCode>,
    pub payment_attempt: Option<PaymentAttempt>,
    pub payment_failure: Option<PaymentFailure>,
    pub escrow_released: bool,
    pub created_at: DateTime<Utc>,
    pub history: Vec<TransitionRecord>,
}

/// Payload for creating a new order. Items and total come from the cart, already priced.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub buyer_id: BuyerId,
    pub vendor_id: VendorId,
    pub items: Vec<LineItem>,
    pub amount_total: Decimal,
}

impl Order {
    /// Creates a new order in `Created`.
    pub fn new(id: OrderId, params: OrderCreate) -> Self {
        Self {
            id,
            buyer_id: params.buyer_id,
            vendor_id: params.vendor_id,
            rider_id: None,
            items: params.items,
            amount_total: params.amount_total,
            status: OrderStatus::Created,
            pickup_code: None,
            delivery_code: None,
            payment_attempt: None,
            payment_failure: None,
            escrow_released: false,
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn code(&self, kind: CodeKind) -> Option<&ConfirmationCode> {
        match kind {
            CodeKind::Pickup => self.pickup_code.as_ref(),
            CodeKind::Delivery => self.delivery_code.as_ref(),
        }
    }

    pub(crate) fn code_mut(&mut self, kind: CodeKind) -> Option<&mut ConfirmationCode> {
        match kind {
            CodeKind::Pickup => self.pickup_code.as_mut(),
            CodeKind::Delivery => self.delivery_code.as_mut(),
        }
    }
}
