//! # System Lifecycle
//!
//! Starting, wiring and stopping the actors behind the fulfillment service.
//!
//! ## Wiring
//!
//! Actors are created without their dependencies and receive them when they start, through
//! `run(context)`:
//!
//! ```rust,ignore
//! let (order_actor, orders) = order_actor::new(capacity);
//! let (ledger_actor, accounts) = ledger::new(capacity);
//!
//! tokio::spawn(order_actor.run(OrderContext { code_validity }));
//! tokio::spawn(ledger_actor.run(()));
//!
//! let service = FulfillmentService::new(&config, orders, accounts, gateway);
//! ```
//!
//! Neither actor holds a client of the other; the service is the only place that talks to
//! both.
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop payment watches** - cancelled and awaited, so no poll result lands mid-shutdown
//! 2. **Drop all clients** - closes the routers' mailboxes
//! 3. **Routers drain** - each closes its entity cells and waits for them
//! 4. **Await completion** - the actor tasks finish
//!
//! ## Observability
//!
//! See the [`tracing`] module.

pub mod fulfillment_system;
pub mod tracing;

pub use fulfillment_system::*;
pub use tracing::*;
