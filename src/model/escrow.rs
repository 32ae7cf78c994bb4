//! Escrow records and vendor balances.
//!
//! A vendor's escrow entries live inside that vendor's [`VendorAccount`], which is hosted by its
//! own actor cell. Moving an entry from held to available is therefore a single step under the
//! vendor's serialization: there is no window in which the entry is released but the balance is
//! not yet credited.

use crate::model::{OrderId, VendorId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    Held,
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub amount: Decimal,
    pub state: EscrowState,
    pub held_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

/// Funds a vendor has in escrow and funds already released to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBalance {
    pub vendor_id: VendorId,
    pub held: Decimal,
    pub available: Decimal,
}

impl VendorBalance {
    pub fn empty(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            held: Decimal::ZERO,
            available: Decimal::ZERO,
        }
    }
}

/// The per-vendor ledger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorAccount {
    pub vendor_id: VendorId,
    pub held: Decimal,
    pub available: Decimal,
    pub entries: HashMap<OrderId, EscrowEntry>,
}

/// Payload for opening a vendor account.
#[derive(Debug, Clone)]
pub struct VendorAccountCreate;

impl VendorAccount {
    pub fn new(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            held: Decimal::ZERO,
            available: Decimal::ZERO,
            entries: HashMap::new(),
        }
    }

    pub fn balance(&self) -> VendorBalance {
        VendorBalance {
            vendor_id: self.vendor_id.clone(),
            held: self.held,
            available: self.available,
        }
    }
}
