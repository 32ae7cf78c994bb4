//! # Entity Cell
//!
//! One task per live entity. The cell owns the entity value outright and drains its mailbox
//! sequentially, which is what serializes every mutation of that one entity without a lock.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Mailbox sender used by the router to reach a cell.
pub type CellSender<T> = mpsc::UnboundedSender<ResourceRequest<T>>;

/// The task owning a single entity.
///
/// The mailbox is unbounded: back-pressure is applied once, at the router's bounded channel, so
/// forwarding a request to a cell never blocks the router.
pub struct EntityCell<T: ActorEntity> {
    id: T::Id,
    item: T,
    receiver: mpsc::UnboundedReceiver<ResourceRequest<T>>,
    context: Arc<T::Context>,
}

impl<T: ActorEntity> EntityCell<T> {
    pub fn new(id: T::Id, item: T, context: Arc<T::Context>) -> (Self, CellSender<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cell = Self {
            id,
            item,
            receiver,
            context,
        };
        (cell, sender)
    }

    /// Processes requests until the entity is deleted or every sender is dropped.
    pub async fn run(mut self, entity_type: &'static str) {
        let id = self.id.clone();
        debug!(entity_type, %id, "Cell started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { respond_to, .. } => {
                    debug!(entity_type, %id, "Get");
                    let _ = respond_to.send(Ok(Some(self.item.clone())));
                }
                ResourceRequest::Update {
                    update, respond_to, ..
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    // Hooks mutate in place, so work on a copy and commit only on success.
                    let mut draft = self.item.clone();
                    match draft.on_update(update, &self.context).await {
                        Ok(()) => {
                            self.item = draft;
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(self.item.clone()));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Action {
                    action, respond_to, ..
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let mut draft = self.item.clone();
                    let result = draft.handle_action(action, &self.context).await;
                    match result {
                        Ok(value) => {
                            self.item = draft;
                            info!(entity_type, %id, "Action ok");
                            let _ = respond_to.send(Ok(value));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action rejected");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Delete { respond_to, .. } => {
                    debug!(entity_type, %id, "Delete");
                    if let Err(e) = self.item.on_delete(&self.context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    info!(entity_type, %id, "Deleted");
                    let _ = respond_to.send(Ok(()));
                    self.drain_after_delete().await;
                    return;
                }
                ResourceRequest::Create { respond_to, .. } => {
                    // The router answers creates itself; reaching a cell means the id is taken.
                    let _ = respond_to.send(Err(FrameworkError::AlreadyExists(id.to_string())));
                }
            }
        }

        debug!(entity_type, %id, "Cell stopped");
    }

    /// Requests queued behind a delete see the entity as gone.
    async fn drain_after_delete(&mut self) {
        self.receiver.close();
        while let Some(msg) = self.receiver.recv().await {
            let id = msg.id().to_string();
            msg.reject(FrameworkError::NotFound(id));
        }
    }
}
