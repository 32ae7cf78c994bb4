//! # Entity Actor
//!
//! A small runtime for hosting stateful records as actors on Tokio. Every entity gets its own
//! task and mailbox, so all mutations of one entity are serialized while different entities
//! proceed in parallel: a per-record lock without any locks.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]): the business rules, written as plain `&mut self` hooks.
//! 2. **Runtime Layer** ([`ResourceActor`] + [`cell::EntityCell`]): routing, one task per entity.
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]): typed async request/response.
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected when the router starts (`run(context)`), not at construction.
//! Actors can therefore be created first and wired afterwards, which breaks construction-order
//! cycles between actors that talk to each other.
//!
//! ```rust,ignore
//! let (orders, order_client) = ResourceActor::<Order>::new(64);
//! let (accounts, account_client) = ResourceActor::<VendorAccount>::new(64);
//! tokio::spawn(accounts.run(()));
//! tokio::spawn(orders.run(OrderContext { code_validity }));
//! ```
//!
//! ## Guarantees
//!
//! - Requests for one entity are handled in the order they reached the router.
//! - A hook returning `Err` leaves the stored entity untouched.
//! - Dropping every client stops the router, which stops every cell and waits for them.
//!
//! ## Testing
//!
//! See the [`mock`] module for `MockClient` and the step-by-step helpers.

pub mod actor;
pub mod cell;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
