use crate::model::{
    BuyerId, CodeKind, LineItem, Order, OrderId, OrderStatus, PaymentFailure, RiderId,
    TransitionRecord, VendorId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Returned by `place_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Read-only view of an order for UIs and audits. Code values are never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub buyer_id: BuyerId,
    pub vendor_id: VendorId,
    pub rider_id: Option<RiderId>,
    pub items: Vec<LineItem>,
    pub amount_total: Decimal,
    pub payment_polls: u32,
    pub payment_failure: Option<PaymentFailure>,
    pub codes_issued: bool,
    pub pickup_confirmed: bool,
    pub delivery_confirmed: bool,
    pub escrow_released: bool,
    pub created_at: DateTime<Utc>,
    pub history: Vec<TransitionRecord>,
}

impl From<Order> for OrderSnapshot {
    fn from(order: Order) -> Self {
        let consumed = |kind| order.code(kind).is_some_and(|code| code.consumed);
        Self {
            codes_issued: order.pickup_code.is_some() && order.delivery_code.is_some(),
            pickup_confirmed: consumed(CodeKind::Pickup),
            delivery_confirmed: consumed(CodeKind::Delivery),
            payment_polls: order.payment_attempt.as_ref().map_or(0, |a| a.polls),
            order_id: order.id,
            status: order.status,
            buyer_id: order.buyer_id,
            vendor_id: order.vendor_id,
            rider_id: order.rider_id,
            items: order.items,
            amount_total: order.amount_total,
            payment_failure: order.payment_failure,
            escrow_released: order.escrow_released,
            created_at: order.created_at,
            history: order.history,
        }
    }
}
