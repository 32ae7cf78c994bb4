//! # Order Client
//!
//! Typed API over `ResourceClient<Order>`. Each method sends one [`OrderAction`] and unpacks the
//! matching [`OrderActionResult`]; state machine rejections come back as [`OrderError`].

use crate::codes::ScannedCode;
use crate::model::{
    CodeKind, ConfirmationCode, Order, OrderCreate, OrderId, OrderStatus, PaymentFailure,
    PaymentRef, RiderId, ScannerRole,
};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity_actor::{ActorClient, FrameworkError, ResourceClient};
use tracing::{debug, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.downcast_entity::<OrderError>() {
            Ok(rejection) => rejection,
            Err(FrameworkError::NotFound(id)) => OrderError::NotFound(id),
            Err(FrameworkError::AlreadyExists(id)) => OrderError::AlreadyExists(id),
            Err(other) => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn create_order(&self, id: OrderId, params: OrderCreate) -> Result<OrderId, OrderError> {
        debug!(?params, "create_order called");
        self.inner.create(id, params).await.map_err(Self::map_error)
    }

    async fn act(&self, id: &OrderId, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        debug!(?action, "Sending action");
        self.inner
            .perform_action(id.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn begin_checkout(&self, id: &OrderId) -> Result<OrderStatus, OrderError> {
        match self.act(id, OrderAction::BeginCheckout).await? {
            OrderActionResult::BeginCheckout(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn attach_payment_attempt(
        &self,
        id: &OrderId,
        reference: PaymentRef,
    ) -> Result<(), OrderError> {
        match self
            .act(id, OrderAction::AttachPaymentAttempt { reference })
            .await?
        {
            OrderActionResult::AttachPaymentAttempt(()) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns the number of polls recorded so far.
    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn record_poll(&self, id: &OrderId) -> Result<u32, OrderError> {
        match self.act(id, OrderAction::RecordPoll).await? {
            OrderActionResult::RecordPoll(polls) => Ok(polls),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn confirm_payment(
        &self,
        id: &OrderId,
        reference: PaymentRef,
    ) -> Result<OrderStatus, OrderError> {
        match self.act(id, OrderAction::ConfirmPayment { reference }).await? {
            OrderActionResult::ConfirmPayment(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn fail_payment(
        &self,
        id: &OrderId,
        failure: PaymentFailure,
    ) -> Result<OrderStatus, OrderError> {
        match self.act(id, OrderAction::FailPayment(failure)).await? {
            OrderActionResult::FailPayment(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn issue_codes(
        &self,
        id: &OrderId,
        pickup: ConfirmationCode,
        delivery: ConfirmationCode,
    ) -> Result<OrderStatus, OrderError> {
        match self
            .act(id, OrderAction::IssueCodes { pickup, delivery })
            .await?
        {
            OrderActionResult::IssueCodes(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Checks a scanned code against the order and, on success, consumes it.
    #[instrument(skip_all, fields(order_id = %id, role = %role))]
    pub async fn verify_code(
        &self,
        id: &OrderId,
        scan: ScannedCode,
        role: ScannerRole,
        now: DateTime<Utc>,
    ) -> Result<(CodeKind, OrderStatus), OrderError> {
        match self
            .act(id, OrderAction::VerifyCode { scan, role, now })
            .await?
        {
            OrderActionResult::VerifyCode(kind, status) => Ok((kind, status)),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> Result<OrderStatus, OrderError> {
        match self.act(id, OrderAction::Cancel).await? {
            OrderActionResult::Cancel(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn assign_rider(&self, id: &OrderId, rider_id: RiderId) -> Result<(), OrderError> {
        match self.act(id, OrderAction::AssignRider(rider_id)).await? {
            OrderActionResult::AssignRider(()) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns `true` if this call set the flag.
    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn mark_escrow_released(&self, id: &OrderId) -> Result<bool, OrderError> {
        match self.act(id, OrderAction::MarkEscrowReleased).await? {
            OrderActionResult::MarkEscrowReleased(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(result: OrderActionResult) -> OrderError {
    OrderError::ActorCommunicationError(format!("unexpected action result: {:?}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_actor::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn test_verify_code_unpacks_result() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let orders = OrderClient::new(client);

        let task = tokio::spawn(async move {
            orders
                .verify_code(
                    &OrderId::from("o1"),
                    ScannedCode::Bare {
                        code: "K7QM2XWD".into(),
                    },
                    ScannerRole::Rider,
                    Utc::now(),
                )
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, OrderId::from("o1"));
        assert!(matches!(action, OrderAction::VerifyCode { .. }));
        responder
            .send(Ok(OrderActionResult::VerifyCode(
                CodeKind::Pickup,
                OrderStatus::InDelivery,
            )))
            .unwrap();

        assert_eq!(
            task.await.unwrap().unwrap(),
            (CodeKind::Pickup, OrderStatus::InDelivery)
        );
    }

    #[tokio::test]
    async fn test_state_machine_rejection_keeps_its_type() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId::from("o1"))
            .return_err(FrameworkError::EntityError(Box::new(
                OrderError::CodeAlreadyConsumed(CodeKind::Pickup),
            )));
        let orders = OrderClient::new(mock.client());

        let result = orders
            .verify_code(
                &OrderId::from("o1"),
                ScannedCode::Bare {
                    code: "K7QM2XWD".into(),
                },
                ScannerRole::Rider,
                Utc::now(),
            )
            .await;
        assert_eq!(result, Err(OrderError::CodeAlreadyConsumed(CodeKind::Pickup)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_unknown_order_maps_to_not_found() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId::from("ghost"))
            .return_err(FrameworkError::NotFound("ghost".into()));
        let orders = OrderClient::new(mock.client());

        assert_eq!(
            orders.cancel(&OrderId::from("ghost")).await,
            Err(OrderError::NotFound("ghost".into()))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_mismatched_result_is_reported_not_panicked() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId::from("o1"))
            .return_ok(OrderActionResult::RecordPoll(1));
        let orders = OrderClient::new(mock.client());

        assert!(matches!(
            orders.cancel(&OrderId::from("o1")).await,
            Err(OrderError::ActorCommunicationError(_))
        ));
    }
}
