//! # Order Actor
//!
//! Hosts every [`Order`] in its own actor cell. All events for one order (payment outcomes,
//! code scans, cancellation) are applied one at a time in arrival order, while different orders
//! proceed in parallel.
//!
//! ## Structure
//!
//! - [`entity`] - the state machine, as the [`ActorEntity`](entity_actor::ActorEntity)
//!   implementation for [`Order`]
//! - [`error`] - [`OrderError`], the typed rejections
//! - [`actions`] - [`OrderAction`] and [`OrderActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (actor, orders) = order_actor::new(32);
//! tokio::spawn(actor.run(OrderContext { code_validity: chrono::Duration::hours(72) }));
//!
//! orders.create_order(order_id.clone(), params).await?;
//! orders.begin_checkout(&order_id).await?;
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::OrderClient;
use crate::model::Order;
use entity_actor::ResourceActor;

/// Settings the state machine reads while applying actions.
#[derive(Debug, Clone)]
pub struct OrderContext {
    /// How long a minted code stays valid.
    pub code_validity: chrono::Duration,
}

/// Creates a new Order actor and its client.
pub fn new(mailbox_capacity: usize) -> (ResourceActor<Order>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(mailbox_capacity);
    (actor, OrderClient::new(generic_client))
}
