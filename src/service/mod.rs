//! # Fulfillment Service
//!
//! The entry point for every external event: checkout, payment progress, scanned codes and
//! cancellation. Each operation reads the order, asks the state machine for exactly one
//! transition, applies the side effects that transition mandates, and returns the new state or
//! a typed failure. A rejected transition is never retried behind the caller's back.
//!
//! Side effects per transition:
//!
//! | Transition | Side effects |
//! |---|---|
//! | `Created → PaymentPending` | charge requested, payment watch started |
//! | `PaymentPending → Paid` | escrow held, codes minted, order moved on to `AwaitingPickup`; [`resume`](FulfillmentService::resume) retries these if they fail |
//! | `InDelivery → Delivered` | escrow released, order flagged, codes forgotten |
//! | `→ Cancelled` | payment watch stopped |

pub mod scan;
pub mod snapshot;

pub use scan::*;
pub use snapshot::*;

use crate::clients::{LedgerClient, OrderClient};
use crate::codes::{CodeIssuer, QrCodec};
use crate::config::FulfillmentConfig;
use crate::error::FulfillmentError;
use crate::ledger::{EscrowLedger, ReleaseOutcome};
use crate::model::{
    BuyerId, CodeKind, LineItem, Order, OrderCreate, OrderId, OrderStatus, PaymentFailure,
    RiderId, ScannerRole, VendorBalance, VendorId,
};
use crate::order_actor::OrderError;
use crate::payment::{
    ChargeRequest, PaymentCoordinator, PaymentGateway, PollObserver, Settlement,
};
use async_trait::async_trait;
use chrono::Utc;
use entity_actor::ActorClient;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Cheap to clone; all clones drive the same orders.
#[derive(Clone)]
pub struct FulfillmentService {
    inner: Arc<Inner>,
}

struct Inner {
    orders: OrderClient,
    escrow: EscrowLedger,
    issuer: CodeIssuer,
    codec: QrCodec,
    payments: PaymentCoordinator,
    debouncer: ScanDebouncer,
}

impl FulfillmentService {
    pub fn new(
        config: &FulfillmentConfig,
        orders: OrderClient,
        accounts: LedgerClient,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                orders,
                escrow: EscrowLedger::new(accounts),
                issuer: CodeIssuer::new(config.codes.length),
                codec: QrCodec::new(config.codes.length),
                payments: PaymentCoordinator::new(gateway, config.payment.clone()),
                debouncer: ScanDebouncer::new(config.scan_debounce),
            }),
        }
    }

    /// Creates the order, moves it to `PaymentPending`, requests the charge and starts
    /// watching it.
    ///
    /// If the charge cannot be requested the order ends in `PaymentFailed` and the error names
    /// it, so the caller can still look it up.
    #[instrument(skip_all, fields(buyer_id = %buyer_id, vendor_id = %vendor_id, amount = %amount_total))]
    pub async fn place_order(
        &self,
        buyer_id: BuyerId,
        vendor_id: VendorId,
        items: Vec<LineItem>,
        amount_total: Decimal,
    ) -> Result<PlacedOrder, FulfillmentError> {
        let inner = &self.inner;
        let order_id = OrderId::generate();
        let params = OrderCreate {
            buyer_id: buyer_id.clone(),
            vendor_id,
            items,
            amount_total,
        };
        inner.orders.create_order(order_id.clone(), params).await?;
        inner.orders.begin_checkout(&order_id).await?;

        let request = ChargeRequest {
            order_id: order_id.clone(),
            buyer_id,
            amount: amount_total,
        };
        let reference = match inner.payments.initiate(&request).await {
            Ok(reference) => reference,
            Err(e) => {
                let failure = PaymentFailure::InitiationFailed(e.to_string());
                inner.orders.fail_payment(&order_id, failure).await?;
                return Err(e.into());
            }
        };
        inner
            .orders
            .attach_payment_attempt(&order_id, reference.clone())
            .await?;
        inner
            .payments
            .watch(order_id.clone(), reference, self.inner.clone())?;

        info!(%order_id, "Order placed, awaiting payment");
        Ok(PlacedOrder {
            order_id,
            status: OrderStatus::PaymentPending,
        })
    }

    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn get_order_status(
        &self,
        order_id: &OrderId,
    ) -> Result<OrderSnapshot, FulfillmentError> {
        Ok(self.inner.load(order_id).await?.into())
    }

    /// Verifies a scanned or typed code and advances the order by one handoff.
    ///
    /// On the delivery handoff the escrow is released before returning. If that release
    /// fails the order is still `Delivered`; [`settle`](Self::settle) finishes the job later.
    #[instrument(skip_all, fields(order_id = %order_id, role = %role))]
    pub async fn submit_confirmation_scan(
        &self,
        order_id: &OrderId,
        raw_payload: &str,
        role: ScannerRole,
    ) -> Result<OrderStatus, FulfillmentError> {
        let inner = &self.inner;
        if inner.debouncer.is_duplicate(order_id, raw_payload) {
            debug!("Duplicate scan dropped");
            return Err(FulfillmentError::DuplicateScan);
        }
        let scan = inner.codec.decode(raw_payload)?;

        let (kind, status) = inner
            .orders
            .verify_code(order_id, scan, role, Utc::now())
            .await?;
        info!(%kind, %status, "Handoff confirmed");

        if status == OrderStatus::Delivered {
            if let Err(e) = inner.release_escrow(order_id).await {
                error!(error = %e, "Escrow release failed after delivery, settle later");
            }
        }
        Ok(status)
    }

    pub async fn get_vendor_balance(
        &self,
        vendor_id: &VendorId,
    ) -> Result<VendorBalance, FulfillmentError> {
        Ok(self.inner.escrow.balance(vendor_id).await?)
    }

    /// Cancels an order that has not been paid, and stops watching its payment.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<OrderStatus, FulfillmentError> {
        let status = self.inner.orders.cancel(order_id).await?;
        self.inner.payments.cancel(order_id).await;
        info!("Order cancelled");
        Ok(status)
    }

    #[instrument(skip_all, fields(order_id = %order_id, rider_id = %rider_id))]
    pub async fn assign_rider(
        &self,
        order_id: &OrderId,
        rider_id: RiderId,
    ) -> Result<(), FulfillmentError> {
        Ok(self.inner.orders.assign_rider(order_id, rider_id).await?)
    }

    /// The QR payload of an unused code, for the party that shows it: the vendor shows the
    /// pickup code, the buyer the delivery code.
    pub async fn confirmation_payload(
        &self,
        order_id: &OrderId,
        kind: CodeKind,
    ) -> Result<String, FulfillmentError> {
        let order = self.inner.load(order_id).await?;
        match order.code(kind) {
            Some(code) if !code.consumed => Ok(self.inner.codec.encode(&code.value, kind, order_id)),
            _ => Err(FulfillmentError::CodeUnavailable {
                order_id: order_id.clone(),
                kind,
            }),
        }
    }

    /// Releases the escrow of a delivered order if that has not happened yet. Idempotent.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn settle(&self, order_id: &OrderId) -> Result<ReleaseOutcome, FulfillmentError> {
        let order = self.inner.load(order_id).await?;
        if order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                event: "settle",
            }
            .into());
        }
        self.inner.release_escrow(order_id).await
    }

    /// Finishes preparing a paid order whose escrow hold or code issue failed after the
    /// payment settled. Both steps are idempotent, so this is safe to call repeatedly.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn resume(&self, order_id: &OrderId) -> Result<OrderStatus, FulfillmentError> {
        let order = self.inner.load(order_id).await?;
        if order.status != OrderStatus::Paid {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                event: "resume",
            }
            .into());
        }
        let status = self.inner.after_payment(order_id).await?;
        info!(%status, "Paid order resumed");
        Ok(status)
    }

    /// Stops all payment watches. Orders and balances stay readable.
    pub async fn shutdown(&self) {
        self.inner.payments.shutdown().await;
    }

    pub fn active_payment_watches(&self) -> usize {
        self.inner.payments.active_watches()
    }
}

impl Inner {
    async fn load(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        self.orders
            .get(order_id.clone())
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()).into())
    }

    async fn release_escrow(&self, order_id: &OrderId) -> Result<ReleaseOutcome, FulfillmentError> {
        let outcome = self.escrow.release(order_id).await?;
        self.orders.mark_escrow_released(order_id).await?;
        self.issuer.revoke(order_id);
        Ok(outcome)
    }

    /// `Paid → AwaitingPickup`: hold the funds, mint the codes, hand them to the order.
    async fn after_payment(&self, order_id: &OrderId) -> Result<OrderStatus, FulfillmentError> {
        let order = self.load(order_id).await?;
        self.escrow
            .hold(order_id, &order.vendor_id, order.amount_total)
            .await?;
        let codes = self.issuer.issue_codes(order_id);
        Ok(self
            .orders
            .issue_codes(order_id, codes.pickup, codes.delivery)
            .await?)
    }
}

#[async_trait]
impl PollObserver for Inner {
    async fn on_attempt(&self, order_id: &OrderId, attempt: u32) {
        if let Err(e) = self.orders.record_poll(order_id).await {
            debug!(%order_id, attempt, error = %e, "Poll not recorded");
        }
    }

    async fn on_settled(&self, order_id: &OrderId, settlement: Settlement) {
        match settlement {
            Settlement::Paid(reference) => {
                match self.orders.confirm_payment(order_id, reference).await {
                    Ok(_) => match self.after_payment(order_id).await {
                        Ok(status) => info!(%order_id, %status, "Payment settled, codes issued"),
                        Err(e) => error!(%order_id, error = %e, "Paid order could not be prepared for pickup, resume later"),
                    },
                    Err(e) => warn!(%order_id, error = %e, "Captured payment not applied to order"),
                }
            }
            Settlement::Failed(failure) => {
                if let Err(e) = self.orders.fail_payment(order_id, failure).await {
                    warn!(%order_id, error = %e, "Payment failure not applied to order");
                }
            }
        }
    }
}
