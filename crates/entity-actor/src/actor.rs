//! # Resource Router
//!
//! This module defines the `ResourceActor`, the server side of the runtime. It keeps the
//! directory of live entities, creates new ones, and forwards every other request to the
//! [`EntityCell`] that owns the addressed entity.

use crate::cell::{CellSender, EntityCell};
use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The router for one entity type.
///
/// # Concurrency Model
/// The router itself never runs domain logic for an existing entity: it looks up the cell and
/// hands the request over. Each cell processes its own mailbox sequentially, so all requests for
/// one entity are serialized while different entities proceed in parallel.
///
/// ```text
///   ResourceClient ──► ResourceActor (directory) ──► EntityCell(order_a)
///                                               └──► EntityCell(order_b)
/// ```
///
/// # Usage Pattern
///
/// 1. **Create**: `ResourceActor::new(capacity)` returns the router and its client.
/// 2. **Wire**: pass the shared context into `actor.run(context)`.
/// 3. **Run**: spawn the returned future.
///
/// ```rust,ignore
/// let (actor, client) = ResourceActor::<Order>::new(64);
/// tokio::spawn(actor.run(order_context));
/// let id = client.create(OrderId::new(), params).await?;
/// ```
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    cells: HashMap<T::Id, CellSender<T>>,
    tasks: JoinSet<()>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new router and its associated `ResourceClient`.
    ///
    /// `buffer_size` bounds the router's inbound channel; clients wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            cells: HashMap::new(),
            tasks: JoinSet::new(),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the routing loop until every client is dropped, then stops all cells and waits
    /// for them to finish.
    pub async fn run(mut self, context: T::Context) {
        // "Order" instead of "fulfillment::model::order::Order"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let context = Arc::new(context);
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create {
                    id,
                    params,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?params, "Create");
                    if self.is_live(&id) {
                        warn!(entity_type, %id, "Already exists");
                        let _ = respond_to.send(Err(FrameworkError::AlreadyExists(id.to_string())));
                        continue;
                    }
                    match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => {
                            if let Err(e) = item.on_create(&context).await {
                                warn!(entity_type, %id, error = %e, "on_create failed");
                                let _ =
                                    respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                                continue;
                            }
                            let (cell, sender) = EntityCell::new(id.clone(), item, context.clone());
                            self.tasks.spawn(cell.run(entity_type));
                            self.cells.insert(id.clone(), sender);
                            info!(entity_type, %id, size = self.cells.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                other => self.forward(entity_type, other),
            }
        }

        let size = self.cells.len();
        // Dropping the senders lets every cell drain its mailbox and exit.
        self.cells.clear();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(entity_type, error = %e, "Cell task failed");
            }
        }
        info!(entity_type, size, "Shutdown");
    }

    fn is_live(&mut self, id: &T::Id) -> bool {
        match self.cells.get(id) {
            Some(sender) if !sender.is_closed() => true,
            Some(_) => {
                // Deleted earlier; the slot can be reused.
                self.cells.remove(id);
                false
            }
            None => false,
        }
    }

    fn forward(&mut self, entity_type: &'static str, msg: ResourceRequest<T>) {
        let id = msg.id().clone();
        if !self.is_live(&id) {
            debug!(entity_type, %id, "Not found");
            msg.reject(FrameworkError::NotFound(id.to_string()));
            return;
        }
        if let Some(sender) = self.cells.get(&id) {
            if let Err(mpsc::error::SendError(msg)) = sender.send(msg) {
                self.cells.remove(&id);
                msg.reject(FrameworkError::NotFound(id.to_string()));
            }
        }
    }
}
