//! # Order State Machine
//!
//! [`ActorEntity`] implementation for [`Order`]. This is the only code that changes an order's
//! `status`.
//!
//! ```text
//! Created ──checkout──▶ PaymentPending ──confirmed──▶ Paid ──codes──▶ AwaitingPickup
//!    │                     │                                              │ pickup code
//!    │                     └──failed/timeout──▶ PaymentFailed             ▼
//!    │                                              │                InDelivery
//!    └──────────────cancel──────────────────────────┴──▶ Cancelled        │ delivery code
//!                                                                          ▼
//!                                                                      Delivered
//! ```
//!
//! Every guard failure returns an [`OrderError`]; the cell runs actions on a copy of the order,
//! so a rejected action never leaves a partial change behind.

use super::actions::{OrderAction, OrderActionResult};
use super::error::OrderError;
use super::OrderContext;
use crate::codes::ScannedCode;
use crate::model::{
    CodeKind, ConfirmationCode, Order, OrderCreate, OrderId, OrderStatus, PaymentAttempt,
    PaymentRef, ScannerRole, TransitionRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity_actor::ActorEntity;
use rust_decimal::Decimal;
use tracing::{debug, info};

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Context = OrderContext;
    type Error = OrderError;

    /// Creates a new order in `Created`, rejecting carts that could never be checked out.
    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, OrderError> {
        let order = Order::new(id, params);
        order.check_payable()?;
        Ok(order)
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        ctx: &OrderContext,
    ) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::BeginCheckout => {
                self.require(OrderStatus::Created, "checkout")?;
                self.check_payable()?;
                self.transition(OrderStatus::PaymentPending);
                Ok(OrderActionResult::BeginCheckout(self.status))
            }
            OrderAction::AttachPaymentAttempt { reference } => {
                self.require(OrderStatus::PaymentPending, "attach payment attempt")?;
                if self.payment_attempt.is_some() {
                    return Err(self.rejected("attach payment attempt"));
                }
                self.payment_attempt = Some(PaymentAttempt {
                    reference,
                    started_at: Utc::now(),
                    polls: 0,
                    last_polled_at: None,
                });
                Ok(OrderActionResult::AttachPaymentAttempt(()))
            }
            OrderAction::RecordPoll => {
                self.require(OrderStatus::PaymentPending, "record poll")?;
                let attempt = self
                    .payment_attempt
                    .as_mut()
                    .ok_or(OrderError::InvalidTransition {
                        from: OrderStatus::PaymentPending,
                        event: "record poll",
                    })?;
                attempt.polls += 1;
                attempt.last_polled_at = Some(Utc::now());
                Ok(OrderActionResult::RecordPoll(attempt.polls))
            }
            OrderAction::ConfirmPayment { reference } => {
                self.require(OrderStatus::PaymentPending, "confirm payment")?;
                self.check_reference(&reference)?;
                self.transition(OrderStatus::Paid);
                Ok(OrderActionResult::ConfirmPayment(self.status))
            }
            OrderAction::FailPayment(failure) => {
                self.require(OrderStatus::PaymentPending, "fail payment")?;
                info!(order_id = %self.id, %failure, "Payment failed");
                self.payment_failure = Some(failure);
                self.transition(OrderStatus::PaymentFailed);
                Ok(OrderActionResult::FailPayment(self.status))
            }
            OrderAction::IssueCodes { pickup, delivery } => {
                self.require(OrderStatus::Paid, "issue codes")?;
                self.check_issued(&pickup, CodeKind::Pickup)?;
                self.check_issued(&delivery, CodeKind::Delivery)?;
                self.pickup_code = Some(pickup);
                self.delivery_code = Some(delivery);
                self.transition(OrderStatus::AwaitingPickup);
                Ok(OrderActionResult::IssueCodes(self.status))
            }
            OrderAction::VerifyCode { scan, role, now } => {
                let kind = self.verify_code(&scan, role, ctx.code_validity, now)?;
                Ok(OrderActionResult::VerifyCode(kind, self.status))
            }
            OrderAction::Cancel => {
                if !self.status.is_cancellable() {
                    return Err(self.rejected("cancel"));
                }
                self.transition(OrderStatus::Cancelled);
                Ok(OrderActionResult::Cancel(self.status))
            }
            OrderAction::AssignRider(rider_id) => {
                if !matches!(
                    self.status,
                    OrderStatus::Paid | OrderStatus::AwaitingPickup | OrderStatus::InDelivery
                ) {
                    return Err(self.rejected("assign rider"));
                }
                debug!(order_id = %self.id, %rider_id, "Rider assigned");
                self.rider_id = Some(rider_id);
                Ok(OrderActionResult::AssignRider(()))
            }
            OrderAction::MarkEscrowReleased => {
                self.require(OrderStatus::Delivered, "mark escrow released")?;
                let changed = !self.escrow_released;
                self.escrow_released = true;
                Ok(OrderActionResult::MarkEscrowReleased(changed))
            }
        }
    }
}

impl Order {
    fn transition(&mut self, to: OrderStatus) {
        let from = self.status;
        self.status = to;
        self.history.push(TransitionRecord {
            from,
            to,
            at: Utc::now(),
        });
        info!(order_id = %self.id, %from, %to, "Order transitioned");
    }

    fn rejected(&self, event: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            from: self.status,
            event,
        }
    }

    fn require(&self, status: OrderStatus, event: &'static str) -> Result<(), OrderError> {
        if self.status == status {
            Ok(())
        } else {
            Err(self.rejected(event))
        }
    }

    fn check_payable(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::ValidationError("order has no items".into()));
        }
        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(OrderError::ValidationError("item quantity must be positive".into()));
        }
        if self.amount_total <= Decimal::ZERO {
            return Err(OrderError::ValidationError(format!(
                "amount total must be positive, got {}",
                self.amount_total
            )));
        }
        Ok(())
    }

    fn check_reference(&self, reference: &PaymentRef) -> Result<(), OrderError> {
        match &self.payment_attempt {
            Some(attempt) if &attempt.reference == reference => Ok(()),
            _ => Err(OrderError::PaymentReferenceMismatch(reference.clone())),
        }
    }

    fn check_issued(&self, code: &ConfirmationCode, kind: CodeKind) -> Result<(), OrderError> {
        if code.kind != kind || code.order_id != self.id || code.consumed {
            return Err(OrderError::ValidationError(format!(
                "{} code was not minted for order {}",
                kind, self.id
            )));
        }
        Ok(())
    }

    /// Applies the matching rules in order and, if they all pass, consumes the code and moves
    /// the order to the next handoff state.
    fn verify_code(
        &mut self,
        scan: &ScannedCode,
        role: ScannerRole,
        validity: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<CodeKind, OrderError> {
        let expected = self
            .status
            .expected_code()
            .ok_or_else(|| self.rejected("code scanned"))?;

        if scan.order_id().is_some_and(|claimed| claimed != &self.id) {
            return Err(OrderError::CodeMismatch);
        }

        let kind = [CodeKind::Pickup, CodeKind::Delivery]
            .into_iter()
            .filter(|kind| scan.kind().map_or(true, |claimed| claimed == *kind))
            .find(|kind| self.code(*kind).is_some_and(|code| code.matches(scan.code())))
            .ok_or(OrderError::CodeMismatch)?;

        let code = self.code_mut(kind).ok_or(OrderError::CodeMismatch)?;
        if code.consumed {
            return Err(OrderError::CodeAlreadyConsumed(kind));
        }
        if kind != expected {
            return Err(OrderError::CodeMismatch);
        }
        if !role.may_confirm(kind) {
            return Err(OrderError::UnauthorizedScanner { role, kind });
        }
        if code.is_expired(validity, now) {
            return Err(OrderError::CodeExpired(kind));
        }
        code.consumed = true;

        let next = match kind {
            CodeKind::Pickup => OrderStatus::InDelivery,
            CodeKind::Delivery => OrderStatus::Delivered,
        };
        self.transition(next);
        Ok(kind)
    }
}
