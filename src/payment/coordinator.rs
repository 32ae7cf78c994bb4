//! # Payment Coordinator
//!
//! Starts charges and watches them until they settle. Each pending order gets one background
//! task that polls the processor on a fixed interval with a capped number of attempts:
//!
//! - `Paid` settles the charge.
//! - `Failed` settles it as declined.
//! - `NotFound` settles it as voided immediately; it is not the same as running out of time.
//! - `Pending` and transient errors use up an attempt and keep going.
//! - Still pending after the last attempt settles it as a timeout.
//!
//! The coordinator owns the tasks, so a watch survives the caller going away. A watch can be
//! cancelled at any wait point, and [`PaymentCoordinator::shutdown`] cancels and awaits them all.

use super::{ChargeRequest, GatewayError, PaymentError, PaymentGateway, PollOutcome};
use crate::config::PaymentPolicy;
use crate::model::{OrderId, PaymentFailure, PaymentRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// How a watched charge ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Paid(PaymentRef),
    Failed(PaymentFailure),
}

/// Receives the progress of a watch.
#[async_trait]
pub trait PollObserver: Send + Sync + 'static {
    /// Called after every poll, whatever its outcome.
    async fn on_attempt(&self, order_id: &OrderId, attempt: u32);

    /// Called once when the charge settles. Not called for cancelled watches.
    async fn on_settled(&self, order_id: &OrderId, settlement: Settlement);
}

struct Watch {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PaymentCoordinator {
    gateway: Arc<dyn PaymentGateway>,
    policy: PaymentPolicy,
    watches: Arc<Mutex<HashMap<OrderId, Watch>>>,
    shutdown: CancellationToken,
}

impl PaymentCoordinator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, policy: PaymentPolicy) -> Self {
        Self {
            gateway,
            policy,
            watches: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    #[instrument(skip_all, fields(order_id = %request.order_id, amount = %request.amount))]
    pub async fn initiate(&self, request: &ChargeRequest) -> Result<PaymentRef, PaymentError> {
        match self.gateway.initiate(request).await {
            Ok(reference) => {
                info!(%reference, "Charge requested");
                Ok(reference)
            }
            Err(source) => {
                warn!(error = %source, "Charge request failed");
                Err(PaymentError::Initiation {
                    order_id: request.order_id.clone(),
                    source,
                })
            }
        }
    }

    /// Starts polling `reference` in the background. At most one watch per order.
    pub fn watch(
        &self,
        order_id: OrderId,
        reference: PaymentRef,
        observer: Arc<dyn PollObserver>,
    ) -> Result<(), PaymentError> {
        if self.shutdown.is_cancelled() {
            return Err(PaymentError::ShutDown);
        }
        let mut watches = self.watches.lock();
        if watches.contains_key(&order_id) {
            return Err(PaymentError::AlreadyWatching(order_id));
        }

        let token = self.shutdown.child_token();
        let poller = Poller {
            gateway: self.gateway.clone(),
            policy: self.policy.clone(),
            order_id: order_id.clone(),
            reference: reference.clone(),
            token: token.clone(),
        };
        let registry = self.watches.clone();
        let span = info_span!("payment_watch", order_id = %order_id, %reference);
        let handle = tokio::spawn(
            async move {
                if let Some(settlement) = poller.run(observer.as_ref()).await {
                    observer.on_settled(&poller.order_id, settlement).await;
                }
                registry.lock().remove(&poller.order_id);
            }
            .instrument(span),
        );

        watches.insert(order_id, Watch { token, handle });
        debug!(active = watches.len(), "Watch started");
        Ok(())
    }

    /// Stops the order's watch and waits for its task to end. Returns whether one was running.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: &OrderId) -> bool {
        let watch = self.watches.lock().remove(order_id);
        match watch {
            Some(watch) => {
                watch.token.cancel();
                if let Err(e) = watch.handle.await {
                    error!("Payment watch task failed: {:?}", e);
                }
                info!("Payment watch cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_watching(&self, order_id: &OrderId) -> bool {
        self.watches.lock().contains_key(order_id)
    }

    pub fn active_watches(&self) -> usize {
        self.watches.lock().len()
    }

    /// Cancels every watch, refuses new ones, and waits for all tasks to end.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let watches: Vec<Watch> = self.watches.lock().drain().map(|(_, w)| w).collect();
        info!(count = watches.len(), "Stopping payment watches");
        for watch in watches {
            if let Err(e) = watch.handle.await {
                error!("Payment watch task failed: {:?}", e);
            }
        }
    }
}

struct Poller {
    gateway: Arc<dyn PaymentGateway>,
    policy: PaymentPolicy,
    order_id: OrderId,
    reference: PaymentRef,
    token: CancellationToken,
}

impl Poller {
    /// Returns `None` when cancelled.
    async fn run(&self, observer: &dyn PollObserver) -> Option<Settlement> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(self.policy.poll_interval) => {}
                _ = self.token.cancelled() => {
                    debug!(attempt, "Watch cancelled while waiting");
                    return None;
                }
            }

            let outcome = tokio::select! {
                outcome = self.gateway.poll_once(&self.reference) => outcome,
                _ = self.token.cancelled() => {
                    debug!(attempt, "Watch cancelled while polling");
                    return None;
                }
            };
            observer.on_attempt(&self.order_id, attempt).await;

            match outcome {
                Ok(PollOutcome::Paid { reference }) => {
                    info!(attempt, "Payment confirmed");
                    return Some(Settlement::Paid(reference));
                }
                Ok(PollOutcome::Failed(reason)) => {
                    info!(attempt, %reason, "Payment declined");
                    return Some(Settlement::Failed(PaymentFailure::Declined(reason)));
                }
                Ok(PollOutcome::NotFound) => {
                    warn!(attempt, reference = %self.reference, "Processor has no record of charge, treating as voided");
                    return Some(Settlement::Failed(PaymentFailure::Voided));
                }
                Ok(PollOutcome::Pending) => debug!(attempt, "Payment still pending"),
                Err(GatewayError::Transient(e)) => debug!(attempt, error = %e, "Transient poll error"),
                Err(GatewayError::Rejected(e)) => warn!(attempt, error = %e, "Poll rejected"),
            }
        }

        warn!(attempts = self.policy.max_attempts, "Payment still pending after last attempt");
        Some(Settlement::Failed(PaymentFailure::Timeout))
    }
}
