//! # Escrow Ledger
//!
//! Buyer funds are held per order from payment confirmation until delivery, then moved to the
//! vendor's available balance exactly once, however many times the release is triggered.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](entity_actor::ActorEntity) implementation for
//!   [`VendorAccount`]
//! - [`actions`] - [`LedgerAction`], [`LedgerActionResult`] and their outcomes
//! - [`error`] - [`LedgerError`]
//! - [`escrow`] - [`EscrowLedger`], the order-keyed facade used by the service
//! - [`new()`] - Factory function that creates the actor and client

pub mod actions;
pub mod entity;
pub mod error;
pub mod escrow;

pub use actions::*;
pub use error::*;
pub use escrow::*;

use crate::clients::LedgerClient;
use crate::model::VendorAccount;
use entity_actor::ResourceActor;

/// Creates a new vendor account actor and its client.
pub fn new(mailbox_capacity: usize) -> (ResourceActor<VendorAccount>, LedgerClient) {
    let (actor, generic_client) = ResourceActor::new(mailbox_capacity);
    (actor, LedgerClient::new(generic_client))
}
