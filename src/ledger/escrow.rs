use super::{HoldOutcome, LedgerError, ReleaseOutcome};
use crate::clients::LedgerClient;
use crate::model::{EscrowEntry, OrderId, VendorBalance, VendorId};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Escrow keyed by order.
///
/// Entries live in the vendor accounts; this keeps the order → vendor index so callers can
/// release by order id alone.
#[derive(Clone)]
pub struct EscrowLedger {
    accounts: LedgerClient,
    owners: Arc<RwLock<HashMap<OrderId, VendorId>>>,
}

impl EscrowLedger {
    pub fn new(accounts: LedgerClient) -> Self {
        Self {
            accounts,
            owners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[instrument(skip_all, fields(order_id = %order_id, vendor_id = %vendor_id))]
    pub async fn hold(
        &self,
        order_id: &OrderId,
        vendor_id: &VendorId,
        amount: Decimal,
    ) -> Result<HoldOutcome, LedgerError> {
        if let Some(held_by) = self.owner(order_id) {
            if &held_by != vendor_id {
                return Err(LedgerError::VendorMismatch {
                    order_id: order_id.clone(),
                    held_by,
                });
            }
        }

        self.accounts.open_account(vendor_id).await?;
        let outcome = self
            .accounts
            .hold(vendor_id, order_id.clone(), amount)
            .await?;
        self.owners
            .write()
            .insert(order_id.clone(), vendor_id.clone());
        Ok(outcome)
    }

    /// Credits the vendor with the order's escrow. Safe to call any number of times.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn release(&self, order_id: &OrderId) -> Result<ReleaseOutcome, LedgerError> {
        let vendor_id = self
            .owner(order_id)
            .ok_or_else(|| LedgerError::UnknownEscrow(order_id.clone()))?;
        let outcome = self.accounts.release(&vendor_id, order_id.clone()).await?;
        match outcome {
            ReleaseOutcome::Released { amount } => info!(%vendor_id, %amount, "Funds released"),
            ReleaseOutcome::AlreadyReleased => warn!(%vendor_id, "Release repeated, ignored"),
        }
        Ok(outcome)
    }

    pub async fn balance(&self, vendor_id: &VendorId) -> Result<VendorBalance, LedgerError> {
        self.accounts.balance(vendor_id).await
    }

    pub async fn entry(&self, order_id: &OrderId) -> Result<Option<EscrowEntry>, LedgerError> {
        match self.owner(order_id) {
            Some(vendor_id) => self.accounts.entry(&vendor_id, order_id.clone()).await,
            None => Ok(None),
        }
    }

    fn owner(&self, order_id: &OrderId) -> Option<VendorId> {
        self.owners.read().get(order_id).cloned()
    }
}
