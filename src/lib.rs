//! # Fulfillment
//!
//! > **Order fulfillment for a local-delivery marketplace.**
//!
//! Takes a placed order through mobile-money payment, a vendor → rider handoff and a
//! rider → buyer handoff, and releases the buyer's money to the vendor only after both handoffs
//! have been proven with single-use codes.
//!
//! ## Core Concepts
//!
//! ### One actor per order
//! Each [`Order`](model::Order) lives in its own actor cell (see the `entity-actor` crate). All
//! events for an order are applied one at a time, while unrelated orders never wait on each
//! other. The state machine in [`order_actor`] is the only code that changes an order's status,
//! and a rejected event leaves the order untouched.
//!
//! ### Escrow that releases once
//! Funds are held per order in the vendor's account, itself an actor. Release is a
//! check-and-set inside that account, so repeated or concurrent release triggers credit the
//! vendor exactly once. See [`ledger`].
//!
//! ### Codes as proof of handoff
//! [`codes::CodeIssuer`] mints a pickup and a delivery code from the OS random source once the
//! payment settles. [`codes::QrCodec`] reads them back from a QR payload or from text a rider
//! typed in.
//!
//! ### Payments that settle or time out
//! [`payment::PaymentCoordinator`] watches each pending charge in a background task with a
//! fixed poll interval and a capped number of attempts. Cancelling the order stops the watch.
//!
//! ## Module Tour
//!
//! - [`service`] - [`FulfillmentService`](service::FulfillmentService), the operations callers use
//! - [`lifecycle`] - [`FulfillmentSystem`](lifecycle::FulfillmentSystem), startup and shutdown
//! - [`order_actor`], [`ledger`] - the two actor-hosted entities
//! - [`clients`] - typed clients for those actors
//! - [`payment`], [`codes`] - the processor seam and the confirmation codes
//! - [`model`] - plain records, all serializable
//! - [`config`], [`error`] - settings and the top-level error
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod codes;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod payment;
pub mod service;

pub use config::FulfillmentConfig;
pub use error::FulfillmentError;
pub use lifecycle::FulfillmentSystem;
pub use service::FulfillmentService;
