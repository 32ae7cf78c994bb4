//! An in-memory [`PaymentGateway`] that plays back scripted poll outcomes. Used by the demo
//! binary and the tests.

use super::{ChargeRequest, GatewayError, PaymentGateway, PollOutcome};
use crate::model::PaymentRef;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Pending,
    Transient,
    Paid,
    Failed(String),
    NotFound,
}

/// The poll answers for one charge, in order. Once exhausted the charge stays pending.
#[derive(Debug, Clone, Default)]
pub struct PaymentScript {
    steps: VecDeque<Step>,
}

impl PaymentScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(mut self, polls: usize) -> Self {
        self.steps.extend(std::iter::repeat(Step::Pending).take(polls));
        self
    }

    pub fn transient(mut self, polls: usize) -> Self {
        self.steps.extend(std::iter::repeat(Step::Transient).take(polls));
        self
    }

    pub fn then_paid(mut self) -> Self {
        self.steps.push_back(Step::Paid);
        self
    }

    pub fn then_failed(mut self, reason: impl Into<String>) -> Self {
        self.steps.push_back(Step::Failed(reason.into()));
        self
    }

    pub fn then_not_found(mut self) -> Self {
        self.steps.push_back(Step::NotFound);
        self
    }
}

#[derive(Default)]
struct Charges {
    /// Scripts waiting for the next `initiate`, first in first out.
    queued: VecDeque<PaymentScript>,
    active: HashMap<PaymentRef, PaymentScript>,
    polls: HashMap<PaymentRef, u32>,
    reject_next: Option<String>,
}

#[derive(Default)]
pub struct ScriptedGateway {
    charges: Mutex<Charges>,
    next_reference: AtomicU64,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The script the next initiated charge will follow.
    pub fn queue(&self, script: PaymentScript) {
        self.charges.lock().queued.push_back(script);
    }

    pub fn fail_next_initiation(&self, reason: impl Into<String>) {
        self.charges.lock().reject_next = Some(reason.into());
    }

    pub fn polls(&self, reference: &PaymentRef) -> u32 {
        self.charges.lock().polls.get(reference).copied().unwrap_or(0)
    }

    pub fn total_polls(&self) -> u32 {
        self.charges.lock().polls.values().sum()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate(&self, request: &ChargeRequest) -> Result<PaymentRef, GatewayError> {
        let mut charges = self.charges.lock();
        if let Some(reason) = charges.reject_next.take() {
            return Err(GatewayError::Rejected(reason));
        }
        let n = self.next_reference.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = PaymentRef::from(format!("pay_{}", n));
        let script = charges.queued.pop_front().unwrap_or_default();
        debug!(%reference, order_id = %request.order_id, "Scripted charge started");
        charges.active.insert(reference.clone(), script);
        Ok(reference)
    }

    async fn poll_once(&self, reference: &PaymentRef) -> Result<PollOutcome, GatewayError> {
        let mut charges = self.charges.lock();
        *charges.polls.entry(reference.clone()).or_default() += 1;
        let step = match charges.active.get_mut(reference) {
            Some(script) => script.steps.pop_front().unwrap_or(Step::Pending),
            None => Step::NotFound,
        };
        match step {
            Step::Pending => Ok(PollOutcome::Pending),
            Step::Transient => Err(GatewayError::Transient("connection reset".into())),
            Step::Paid => Ok(PollOutcome::Paid {
                reference: reference.clone(),
            }),
            Step::Failed(reason) => Ok(PollOutcome::Failed(reason)),
            Step::NotFound => Ok(PollOutcome::NotFound),
        }
    }
}
