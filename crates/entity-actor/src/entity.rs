//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every record (an order, a vendor account, …)
//! implements to be hosted by the runtime. It names the associated types for IDs, DTOs,
//! actions, context and errors, and provides the lifecycle hooks (`on_create`, `on_update`,
//! `on_delete`, `handle_action`).
//!
//! # Architecture Note
//! Each live entity is owned by its own [`EntityCell`](crate::cell::EntityCell) task. Every hook
//! below therefore runs with exclusive access to `self`: two requests for the same entity never
//! interleave, while requests for different entities run in parallel.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_update`]
//! - [`ActorEntity::on_delete`]
//!
//! The defaults do nothing (`Ok(())`). Only [`ActorEntity::handle_action`] is mandatory, since
//! actions are where an entity's domain rules live.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any entity must implement to be managed by a [`ResourceActor`](crate::ResourceActor).
///
/// # Async & Context
/// The trait is `#[async_trait]` so hooks may await other actors. The `Context` is shared by
/// every cell of the same entity type (it is wrapped in an `Arc` by the runtime) and is the place
/// for policies and clients the entity needs ("late binding": the context is handed to
/// `run()`, not to `new()`).
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity. Chosen by the caller at creation time.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Enum representing entity-specific operations (e.g. a state transition).
    type Action: Send + Sync + Debug;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug;

    /// Runtime dependencies shared by all cells of this entity type. Use `()` if none.
    type Context: Send + Sync + 'static;

    /// The error type for this entity.
    ///
    /// # Design Note: Error Granularity
    /// One error enum per entity rather than one per action. Clients match on a single type,
    /// at the cost of that enum being the union of every action's failure modes.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the ID and payload.
    /// Called before `on_create`; rejecting here means nothing is stored.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after construction, before the entity becomes addressable.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        _update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called immediately before the entity is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle an entity-specific action.
    ///
    /// The cell runs this on a copy of the entity and keeps the copy only on `Ok`, so a
    /// rejected action never leaves a partial change behind.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
