use crate::clients::{LedgerClient, OrderClient};
use crate::config::FulfillmentConfig;
use crate::error::FulfillmentError;
use crate::order_actor::OrderContext;
use crate::payment::PaymentGateway;
use crate::service::FulfillmentService;
use std::sync::Arc;
use tracing::{error, info};

/// Owns the running fulfillment stack.
///
/// `FulfillmentSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the order and vendor account actors
/// - **Dependency Wiring**: Handing the service its clients, the gateway and the config
///
/// # Example
///
/// ```ignore
/// let system = FulfillmentSystem::new(FulfillmentConfig::from_env()?, gateway)?;
///
/// let placed = system.service.place_order(buyer, vendor, items, total).await?;
/// let snapshot = system.service.get_order_status(&placed.order_id).await?;
///
/// system.shutdown().await?;
/// ```
pub struct FulfillmentSystem {
    pub service: FulfillmentService,

    /// Direct access to the order actor, mostly for inspection in tests.
    pub orders: OrderClient,

    pub accounts: LedgerClient,

    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl FulfillmentSystem {
    /// Validates the config, spawns both actors and wires the service. Must be called inside a
    /// Tokio runtime.
    pub fn new(
        config: FulfillmentConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, FulfillmentError> {
        config.validate()?;

        let (order_actor, orders) = crate::order_actor::new(config.mailbox_capacity);
        let (ledger_actor, accounts) = crate::ledger::new(config.mailbox_capacity);

        let order_handle = tokio::spawn(order_actor.run(OrderContext {
            code_validity: config.code_validity(),
        }));
        let ledger_handle = tokio::spawn(ledger_actor.run(()));

        let service = FulfillmentService::new(&config, orders.clone(), accounts.clone(), gateway);
        info!(?config, "Fulfillment system started");

        Ok(Self {
            service,
            orders,
            accounts,
            handles: vec![order_handle, ledger_handle],
        })
    }

    /// Stops payment watches, then closes the actors' mailboxes and waits for them to drain.
    ///
    /// Clones of the service or clients held elsewhere keep the mailboxes open; drop them
    /// first.
    pub async fn shutdown(self) -> Result<(), FulfillmentError> {
        info!("Shutting down fulfillment system...");
        self.service.shutdown().await;

        drop(self.service);
        drop(self.orders);
        drop(self.accounts);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(FulfillmentError::Runtime(format!("Actor task failed: {:?}", e)));
            }
        }

        info!("Fulfillment system shutdown complete.");
        Ok(())
    }
}
