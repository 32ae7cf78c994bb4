//! # Generic Messages
//!
//! Messages exchanged between a [`ResourceClient`](crate::ResourceClient), the
//! [`ResourceActor`](crate::ResourceActor) router and the per-entity cells.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request sent to the runtime.
///
/// The variants map to the CRUD lifecycle plus an `Action` variant for entity-specific logic.
/// `Create` is handled by the router; every other variant is forwarded unchanged to the cell
/// owning `id`, so requests for one entity are answered in the order they were sent.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        id: T::Id,
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

impl<T: ActorEntity> ResourceRequest<T> {
    /// The entity this request addresses.
    pub fn id(&self) -> &T::Id {
        match self {
            ResourceRequest::Create { id, .. }
            | ResourceRequest::Get { id, .. }
            | ResourceRequest::Update { id, .. }
            | ResourceRequest::Delete { id, .. }
            | ResourceRequest::Action { id, .. } => id,
        }
    }

    /// Answers the request with an error, whatever its response type.
    pub fn reject(self, error: FrameworkError) {
        match self {
            ResourceRequest::Create { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            ResourceRequest::Get { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            ResourceRequest::Update { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            ResourceRequest::Delete { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            ResourceRequest::Action { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
        }
    }
}
