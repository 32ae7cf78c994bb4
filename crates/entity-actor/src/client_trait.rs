//! # ActorClient Trait
//!
//! Common interface for domain clients: default `get` and `delete` built on a
//! [`ResourceClient`], with the runtime error mapped into the domain's error type.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for domain clients to inherit the standard read/delete operations.
///
/// ```rust,ignore
/// #[async_trait]
/// impl ActorClient<Order> for OrderClient {
///     type Error = OrderError;
///
///     fn inner(&self) -> &ResourceClient<Order> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> OrderError {
///         e.downcast_entity::<OrderError>()
///             .unwrap_or_else(|e| OrderError::ActorCommunicationError(e.to_string()))
///     }
/// }
///
/// // get() and delete() come for free
/// let order = client.get(order_id).await?;
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The domain error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map runtime errors to the domain error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Delete an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
