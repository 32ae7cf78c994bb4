use entity_actor::mock::MockClient;
use entity_actor::FrameworkError;
use fulfillment::clients::LedgerClient;
use fulfillment::config::PaymentPolicy;
use fulfillment::ledger::{HoldOutcome, LedgerActionResult, ReleaseOutcome};
use fulfillment::model::{
    BuyerId, CodeKind, LineItem, OrderStatus, ScannerRole, VendorAccount, VendorId,
};
use fulfillment::order_actor::{self, OrderContext, OrderError};
use fulfillment::payment::{PaymentScript, ScriptedGateway};
use fulfillment::service::FulfillmentService;
use fulfillment::{FulfillmentConfig, FulfillmentError};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

fn config() -> FulfillmentConfig {
    FulfillmentConfig {
        payment: PaymentPolicy {
            poll_interval: Duration::from_millis(2),
            max_attempts: 10,
        },
        scan_debounce: Duration::ZERO,
        ..FulfillmentConfig::default()
    }
}

async fn wait_for_watches(service: &FulfillmentService) {
    for _ in 0..400 {
        if service.active_payment_watches() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("payment watch never finished");
}

/// Real Order actor with a mocked vendor ledger.
///
/// The first release attempt after delivery fails; the order still ends `Delivered` and a
/// later `settle` credits the vendor.
#[tokio::test]
async fn test_release_failure_is_recovered_by_settle() {
    let vendor = VendorId::from("vendor_1");
    let mut ledger_mock = MockClient::<VendorAccount>::new();

    // Payment settles: account opened, funds held.
    ledger_mock.expect_create().return_ok(vendor.clone());
    ledger_mock
        .expect_action(vendor.clone())
        .return_ok(LedgerActionResult::Hold(HoldOutcome::Held));
    // Delivery: the ledger is unreachable.
    ledger_mock
        .expect_action(vendor.clone())
        .return_err(FrameworkError::ActorClosed);
    // Settle: release goes through.
    ledger_mock
        .expect_action(vendor.clone())
        .return_ok(LedgerActionResult::Release(ReleaseOutcome::Released {
            amount: Decimal::from(1500),
        }));

    let (order_actor, orders) = order_actor::new(8);
    let actor_handle = tokio::spawn(order_actor.run(OrderContext {
        code_validity: chrono::Duration::hours(72),
    }));

    let gateway = Arc::new(ScriptedGateway::new());
    gateway.queue(PaymentScript::new().then_paid());
    let service = FulfillmentService::new(
        &config(),
        orders,
        LedgerClient::new(ledger_mock.client()),
        gateway,
    );

    let order_id = service
        .place_order(
            BuyerId::from("buyer_1"),
            vendor.clone(),
            vec![LineItem::new("sku_rice_5kg", 1, Decimal::from(1500))],
            Decimal::from(1500),
        )
        .await
        .expect("Failed to place order")
        .order_id;
    wait_for_watches(&service).await;
    assert_eq!(
        service.get_order_status(&order_id).await.unwrap().status,
        OrderStatus::AwaitingPickup
    );

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    service
        .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
        .await
        .unwrap();
    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &delivery, ScannerRole::Buyer)
            .await
            .unwrap(),
        OrderStatus::Delivered
    );
    assert!(!service.get_order_status(&order_id).await.unwrap().escrow_released);

    assert_eq!(
        service.settle(&order_id).await.unwrap(),
        ReleaseOutcome::Released {
            amount: Decimal::from(1500)
        }
    );
    assert!(service.get_order_status(&order_id).await.unwrap().escrow_released);

    ledger_mock.verify();

    service.shutdown().await;
    drop(service);
    actor_handle.await.unwrap();
}

/// A paid order whose escrow could not be held waits in `Paid` without codes until `resume`
/// holds the funds and issues them.
#[tokio::test]
async fn test_failed_hold_is_recovered_by_resume() {
    let vendor = VendorId::from("vendor_1");
    let mut ledger_mock = MockClient::<VendorAccount>::new();

    // Payment settles: the account exists, the ledger is unreachable for the hold.
    ledger_mock
        .expect_create()
        .return_err(FrameworkError::AlreadyExists(vendor.to_string()));
    ledger_mock
        .expect_action(vendor.clone())
        .return_err(FrameworkError::ActorClosed);
    // Resume: the ledger is back.
    ledger_mock
        .expect_create()
        .return_err(FrameworkError::AlreadyExists(vendor.to_string()));
    ledger_mock
        .expect_action(vendor.clone())
        .return_ok(LedgerActionResult::Hold(HoldOutcome::Held));
    let mut account = VendorAccount::new(vendor.clone());
    account.held = Decimal::from(500);
    ledger_mock.expect_get(vendor.clone()).return_ok(Some(account));

    let (order_actor, orders) = order_actor::new(8);
    let actor_handle = tokio::spawn(order_actor.run(OrderContext {
        code_validity: chrono::Duration::hours(72),
    }));

    let gateway = Arc::new(ScriptedGateway::new());
    gateway.queue(PaymentScript::new().pending(1).then_paid());
    let service = FulfillmentService::new(
        &config(),
        orders,
        LedgerClient::new(ledger_mock.client()),
        gateway,
    );

    let order_id = service
        .place_order(
            BuyerId::from("buyer_1"),
            vendor.clone(),
            vec![LineItem::new("sku_oil_1l", 2, Decimal::from(250))],
            Decimal::from(500),
        )
        .await
        .expect("Failed to place order")
        .order_id;
    wait_for_watches(&service).await;

    let snapshot = service.get_order_status(&order_id).await.unwrap();
    assert_eq!(snapshot.status, OrderStatus::Paid);
    assert_eq!(snapshot.payment_polls, 2);
    assert!(!snapshot.codes_issued);
    assert_eq!(
        service.confirmation_payload(&order_id, CodeKind::Pickup).await,
        Err(FulfillmentError::CodeUnavailable {
            order_id: order_id.clone(),
            kind: CodeKind::Pickup
        })
    );
    // Paid orders are past the point of cancellation.
    assert!(service.cancel_order(&order_id).await.is_err());

    assert_eq!(
        service.resume(&order_id).await.unwrap(),
        OrderStatus::AwaitingPickup
    );
    assert!(service.get_order_status(&order_id).await.unwrap().codes_issued);
    assert_eq!(
        service.get_vendor_balance(&vendor).await.unwrap().held,
        Decimal::from(500)
    );
    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Vendor)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );

    // Nothing left to resume.
    assert!(matches!(
        service.resume(&order_id).await,
        Err(FulfillmentError::Order(OrderError::InvalidTransition {
            from: OrderStatus::InDelivery,
            ..
        }))
    ));

    ledger_mock.verify();

    service.shutdown().await;
    drop(service);
    actor_handle.await.unwrap();
}
