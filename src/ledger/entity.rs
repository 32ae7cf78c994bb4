//! [`ActorEntity`] implementation for [`VendorAccount`].
//!
//! Each vendor's account runs in its own cell, so the check-and-set inside `Release` cannot
//! interleave with another release or hold for the same vendor.

use super::actions::{HoldOutcome, LedgerAction, LedgerActionResult, ReleaseOutcome};
use super::error::LedgerError;
use crate::model::{
    EscrowEntry, EscrowState, OrderId, VendorAccount, VendorAccountCreate, VendorId,
};
use async_trait::async_trait;
use chrono::Utc;
use entity_actor::ActorEntity;
use rust_decimal::Decimal;
use tracing::info;

#[async_trait]
impl ActorEntity for VendorAccount {
    type Id = VendorId;
    type Create = VendorAccountCreate;
    type Update = ();
    type Action = LedgerAction;
    type ActionResult = LedgerActionResult;
    type Context = ();
    type Error = LedgerError;

    fn from_create_params(id: VendorId, _params: VendorAccountCreate) -> Result<Self, LedgerError> {
        Ok(VendorAccount::new(id))
    }

    async fn handle_action(
        &mut self,
        action: LedgerAction,
        _ctx: &(),
    ) -> Result<LedgerActionResult, LedgerError> {
        match action {
            LedgerAction::Hold { order_id, amount } => {
                self.hold(order_id, amount).map(LedgerActionResult::Hold)
            }
            LedgerAction::Release { order_id } => {
                self.release(&order_id).map(LedgerActionResult::Release)
            }
            LedgerAction::Entry { order_id } => Ok(LedgerActionResult::Entry(
                self.entries.get(&order_id).cloned(),
            )),
        }
    }
}

impl VendorAccount {
    fn hold(&mut self, order_id: OrderId, amount: Decimal) -> Result<HoldOutcome, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if let Some(existing) = self.entries.get(&order_id) {
            if existing.amount != amount {
                return Err(LedgerError::AmountMismatch {
                    order_id,
                    held: existing.amount,
                    requested: amount,
                });
            }
            return Ok(HoldOutcome::AlreadyHeld);
        }

        self.held += amount;
        info!(vendor_id = %self.vendor_id, %order_id, %amount, held = %self.held, "Escrow held");
        self.entries.insert(
            order_id.clone(),
            EscrowEntry {
                order_id,
                vendor_id: self.vendor_id.clone(),
                amount,
                state: EscrowState::Held,
                held_at: Utc::now(),
                released_at: None,
            },
        );
        Ok(HoldOutcome::Held)
    }

    fn release(&mut self, order_id: &OrderId) -> Result<ReleaseOutcome, LedgerError> {
        let entry = self
            .entries
            .get_mut(order_id)
            .ok_or_else(|| LedgerError::UnknownEscrow(order_id.clone()))?;
        if entry.state == EscrowState::Released {
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        entry.state = EscrowState::Released;
        entry.released_at = Some(Utc::now());
        let amount = entry.amount;
        self.held -= amount;
        self.available += amount;
        info!(vendor_id = %self.vendor_id, %order_id, %amount, available = %self.available, "Escrow released");
        Ok(ReleaseOutcome::Released { amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> VendorAccount {
        VendorAccount::from_create_params(VendorId::from("vendor_1"), VendorAccountCreate).unwrap()
    }

    async fn act(
        account: &mut VendorAccount,
        action: LedgerAction,
    ) -> Result<LedgerActionResult, LedgerError> {
        account.handle_action(action, &()).await
    }

    fn hold(order: &str, amount: i64) -> LedgerAction {
        LedgerAction::Hold {
            order_id: OrderId::from(order),
            amount: Decimal::from(amount),
        }
    }

    fn release(order: &str) -> LedgerAction {
        LedgerAction::Release {
            order_id: OrderId::from(order),
        }
    }

    #[tokio::test]
    async fn test_release_credits_exactly_once() {
        let mut account = account();
        act(&mut account, hold("o1", 1500)).await.unwrap();
        assert_eq!(account.balance().held, Decimal::from(1500));

        assert_eq!(
            act(&mut account, release("o1")).await.unwrap(),
            LedgerActionResult::Release(ReleaseOutcome::Released {
                amount: Decimal::from(1500)
            })
        );
        assert_eq!(
            act(&mut account, release("o1")).await.unwrap(),
            LedgerActionResult::Release(ReleaseOutcome::AlreadyReleased)
        );

        let balance = account.balance();
        assert_eq!(balance.held, Decimal::ZERO);
        assert_eq!(balance.available, Decimal::from(1500));
    }

    #[tokio::test]
    async fn test_repeated_hold_is_a_no_op() {
        let mut account = account();
        act(&mut account, hold("o1", 200)).await.unwrap();
        assert_eq!(
            act(&mut account, hold("o1", 200)).await.unwrap(),
            LedgerActionResult::Hold(HoldOutcome::AlreadyHeld)
        );
        assert_eq!(account.held, Decimal::from(200));

        assert!(matches!(
            act(&mut account, hold("o1", 300)).await,
            Err(LedgerError::AmountMismatch { .. })
        ));
        assert_eq!(account.held, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_release_of_unknown_order_fails() {
        let mut account = account();
        assert_eq!(
            act(&mut account, release("ghost")).await,
            Err(LedgerError::UnknownEscrow(OrderId::from("ghost")))
        );
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let mut account = account();
        assert!(matches!(
            act(&mut account, hold("o1", 0)).await,
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(account.entries.is_empty());
    }

    #[tokio::test]
    async fn test_entry_reports_state() {
        let mut account = account();
        act(&mut account, hold("o1", 50)).await.unwrap();
        act(&mut account, release("o1")).await.unwrap();
        let entry = match act(
            &mut account,
            LedgerAction::Entry {
                order_id: OrderId::from("o1"),
            },
        )
        .await
        .unwrap()
        {
            LedgerActionResult::Entry(entry) => entry.unwrap(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(entry.state, EscrowState::Released);
        assert!(entry.released_at.is_some());
    }
}
