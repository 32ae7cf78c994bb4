//! # Ledger Client
//!
//! Typed API over `ResourceClient<VendorAccount>`, one account per vendor.

use crate::ledger::{HoldOutcome, LedgerAction, LedgerActionResult, LedgerError, ReleaseOutcome};
use crate::model::{EscrowEntry, OrderId, VendorAccount, VendorAccountCreate, VendorBalance, VendorId};
use async_trait::async_trait;
use entity_actor::{ActorClient, FrameworkError, ResourceClient};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// Client for interacting with the vendor account actor.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<VendorAccount>,
}

#[async_trait]
impl ActorClient<VendorAccount> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<VendorAccount> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.downcast_entity::<LedgerError>() {
            Ok(rejection) => rejection,
            Err(FrameworkError::NotFound(id)) => LedgerError::NotFound(id),
            Err(other) => LedgerError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<VendorAccount>) -> Self {
        Self { inner }
    }

    /// Opens the vendor's account unless it already exists.
    #[instrument(skip_all, fields(vendor_id = %vendor_id))]
    pub async fn open_account(&self, vendor_id: &VendorId) -> Result<(), LedgerError> {
        match self.inner.create(vendor_id.clone(), VendorAccountCreate).await {
            Ok(_) => Ok(()),
            Err(FrameworkError::AlreadyExists(_)) => {
                debug!("Account already open");
                Ok(())
            }
            Err(e) => Err(Self::map_error(e)),
        }
    }

    async fn act(
        &self,
        vendor_id: &VendorId,
        action: LedgerAction,
    ) -> Result<LedgerActionResult, LedgerError> {
        debug!(?action, "Sending action");
        self.inner
            .perform_action(vendor_id.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip_all, fields(vendor_id = %vendor_id, order_id = %order_id))]
    pub async fn hold(
        &self,
        vendor_id: &VendorId,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<HoldOutcome, LedgerError> {
        match self.act(vendor_id, LedgerAction::Hold { order_id, amount }).await? {
            LedgerActionResult::Hold(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(vendor_id = %vendor_id, order_id = %order_id))]
    pub async fn release(
        &self,
        vendor_id: &VendorId,
        order_id: OrderId,
    ) -> Result<ReleaseOutcome, LedgerError> {
        match self.act(vendor_id, LedgerAction::Release { order_id }).await? {
            LedgerActionResult::Release(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(vendor_id = %vendor_id, order_id = %order_id))]
    pub async fn entry(
        &self,
        vendor_id: &VendorId,
        order_id: OrderId,
    ) -> Result<Option<EscrowEntry>, LedgerError> {
        match self.act(vendor_id, LedgerAction::Entry { order_id }).await? {
            LedgerActionResult::Entry(entry) => Ok(entry),
            other => Err(unexpected(other)),
        }
    }

    /// A vendor that never had escrow has an empty balance.
    pub async fn balance(&self, vendor_id: &VendorId) -> Result<VendorBalance, LedgerError> {
        Ok(self
            .get(vendor_id.clone())
            .await?
            .map(|account| account.balance())
            .unwrap_or_else(|| VendorBalance::empty(vendor_id.clone())))
    }
}

fn unexpected(result: LedgerActionResult) -> LedgerError {
    LedgerError::ActorCommunicationError(format!("unexpected action result: {:?}", result))
}
