use entity_actor::ActorClient;
use fulfillment::codes::DecodeError;
use fulfillment::config::PaymentPolicy;
use fulfillment::ledger::ReleaseOutcome;
use fulfillment::model::{
    BuyerId, CodeKind, LineItem, OrderId, OrderStatus, PaymentFailure, RiderId, ScannerRole,
    VendorId,
};
use fulfillment::order_actor::OrderError;
use fulfillment::payment::{PaymentError, PaymentScript, ScriptedGateway};
use fulfillment::service::{FulfillmentService, OrderSnapshot};
use fulfillment::{FulfillmentConfig, FulfillmentError, FulfillmentSystem};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

fn config(max_attempts: u32) -> FulfillmentConfig {
    FulfillmentConfig {
        payment: PaymentPolicy {
            poll_interval: Duration::from_millis(5),
            max_attempts,
        },
        scan_debounce: Duration::ZERO,
        ..FulfillmentConfig::default()
    }
}

fn start(config: FulfillmentConfig) -> (FulfillmentSystem, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let system = FulfillmentSystem::new(config, gateway.clone()).expect("valid config");
    (system, gateway)
}

async fn place(service: &FulfillmentService, vendor: &str) -> OrderId {
    service
        .place_order(
            BuyerId::from("buyer_1"),
            VendorId::from(vendor),
            vec![
                LineItem::new("sku_rice_5kg", 2, Decimal::from(600)),
                LineItem::new("sku_oil_1l", 1, Decimal::from(300)),
            ],
            Decimal::from(1500),
        )
        .await
        .expect("Failed to place order")
        .order_id
}

/// Polls the order until payment has settled one way or the other.
async fn settled(service: &FulfillmentService, order_id: &OrderId) -> OrderSnapshot {
    for _ in 0..400 {
        let snapshot = service.get_order_status(order_id).await.unwrap();
        if !matches!(snapshot.status, OrderStatus::PaymentPending | OrderStatus::Paid) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("payment for {} never settled", order_id);
}

/// Places an order that is paid on the first poll and waits for its codes.
async fn ready_for_pickup(
    service: &FulfillmentService,
    gateway: &ScriptedGateway,
    vendor: &str,
) -> OrderId {
    gateway.queue(PaymentScript::new().then_paid());
    let order_id = place(service, vendor).await;
    assert_eq!(settled(service, &order_id).await.status, OrderStatus::AwaitingPickup);
    order_id
}

fn code_of(payload: &str) -> &str {
    payload.rsplit(':').next().unwrap()
}

/// Full end-to-end run: paid on the third poll, both handoffs, escrow released once.
#[tokio::test]
async fn test_order_paid_on_third_poll_is_delivered_and_settled() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let vendor = VendorId::from("vendor_1");

    gateway.queue(PaymentScript::new().pending(2).then_paid());
    let order_id = place(service, "vendor_1").await;

    let snapshot = settled(service, &order_id).await;
    assert_eq!(snapshot.status, OrderStatus::AwaitingPickup);
    assert_eq!(snapshot.payment_polls, 3);
    assert!(snapshot.codes_issued);
    let balance = service.get_vendor_balance(&vendor).await.unwrap();
    assert_eq!(balance.held, Decimal::from(1500));
    assert_eq!(balance.available, Decimal::ZERO);

    service
        .assign_rider(&order_id, RiderId::from("rider_1"))
        .await
        .unwrap();

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );

    // The pickup code is spent.
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Order(OrderError::CodeAlreadyConsumed(
            CodeKind::Pickup
        )))
    );
    assert!(matches!(
        service.confirmation_payload(&order_id, CodeKind::Pickup).await,
        Err(FulfillmentError::CodeUnavailable { .. })
    ));

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

    let balance = service.get_vendor_balance(&vendor).await.unwrap();
    assert_eq!(balance.held, Decimal::ZERO);
    assert_eq!(balance.available, Decimal::from(1500));

    let snapshot = service.get_order_status(&order_id).await.unwrap();
    assert!(snapshot.escrow_released);
    assert!(snapshot.pickup_confirmed && snapshot.delivery_confirmed);
    assert_eq!(snapshot.rider_id, Some(RiderId::from("rider_1")));
    let path: Vec<OrderStatus> = snapshot.history.iter().map(|t| t.to).collect();
    assert_eq!(
        path,
        vec![
            OrderStatus::PaymentPending,
            OrderStatus::Paid,
            OrderStatus::AwaitingPickup,
            OrderStatus::InDelivery,
            OrderStatus::Delivered,
        ]
    );

    // Settling again changes nothing.
    assert_eq!(
        service.settle(&order_id).await.unwrap(),
        ReleaseOutcome::AlreadyReleased
    );
    assert_eq!(
        service.get_vendor_balance(&vendor).await.unwrap().available,
        Decimal::from(1500)
    );
    assert_eq!(service.active_payment_watches(), 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_not_found_on_first_poll_voids_payment() {
    let (system, gateway) = start(config(20));
    let service = &system.service;

    gateway.queue(PaymentScript::new().then_not_found());
    let order_id = place(service, "vendor_1").await;

    let snapshot = settled(service, &order_id).await;
    assert_eq!(snapshot.status, OrderStatus::PaymentFailed);
    assert_eq!(snapshot.payment_failure, Some(PaymentFailure::Voided));
    assert_eq!(snapshot.payment_polls, 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.total_polls(), 1);
    assert_eq!(
        service.cancel_order(&order_id).await.unwrap(),
        OrderStatus::Cancelled
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unresolved_payment_times_out_at_the_cap() {
    let (system, gateway) = start(config(3));
    let service = &system.service;

    gateway.queue(PaymentScript::new().pending(100));
    let order_id = place(service, "vendor_1").await;

    let snapshot = settled(service, &order_id).await;
    assert_eq!(snapshot.status, OrderStatus::PaymentFailed);
    assert_eq!(snapshot.payment_failure, Some(PaymentFailure::Timeout));
    assert_eq!(snapshot.payment_polls, 3);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.total_polls(), 3);
    assert_eq!(
        service.get_vendor_balance(&VendorId::from("vendor_1")).await.unwrap().held,
        Decimal::ZERO
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let (system, gateway) = start(config(10_000));
    let service = &system.service;

    let order_id = place(service, "vendor_1").await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(
        service.cancel_order(&order_id).await.unwrap(),
        OrderStatus::Cancelled
    );
    assert_eq!(service.active_payment_watches(), 0);

    let polls = gateway.total_polls();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.total_polls(), polls);

    // Terminal: a second cancel is rejected.
    assert!(matches!(
        service.cancel_order(&order_id).await,
        Err(FulfillmentError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            ..
        }))
    ));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delivery_code_before_pickup_is_rejected() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;

    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await
        .unwrap();
    let result = service
        .submit_confirmation_scan(&order_id, &delivery, ScannerRole::Rider)
        .await;
    assert_eq!(result, Err(FulfillmentError::Order(OrderError::CodeMismatch)));
    assert!(result.unwrap_err().is_retryable());
    assert_eq!(
        service.get_order_status(&order_id).await.unwrap().status,
        OrderStatus::AwaitingPickup
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_codes_from_another_order_are_rejected() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let first = ready_for_pickup(service, &gateway, "vendor_1").await;
    let second = ready_for_pickup(service, &gateway, "vendor_1").await;

    let payload = service
        .confirmation_payload(&first, CodeKind::Pickup)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&second, &payload, ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Order(OrderError::CodeMismatch))
    );
    assert_eq!(
        service
            .submit_confirmation_scan(&second, code_of(&payload), ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Order(OrderError::CodeMismatch))
    );

    // The code still works where it belongs.
    assert_eq!(
        service
            .submit_confirmation_scan(&first, &payload, ScannerRole::Rider)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );
    assert_eq!(
        service.get_order_status(&second).await.unwrap().status,
        OrderStatus::AwaitingPickup
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_typed_codes_resolve_by_phase() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    let code = code_of(&pickup).to_lowercase();
    let typed = format!(" {}-{} ", &code[..4], &code[4..]);
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &typed, ScannerRole::Vendor)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );

    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, code_of(&delivery), ScannerRole::Buyer)
            .await
            .unwrap(),
        OrderStatus::Delivered
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scanner_roles_are_enforced() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Buyer)
            .await,
        Err(FulfillmentError::Order(OrderError::UnauthorizedScanner {
            role: ScannerRole::Buyer,
            kind: CodeKind::Pickup
        }))
    );
    service
        .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Vendor)
        .await
        .unwrap();

    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await
        .unwrap();
    assert!(matches!(
        service
            .submit_confirmation_scan(&order_id, code_of(&delivery), ScannerRole::Vendor)
            .await,
        Err(FulfillmentError::Order(OrderError::UnauthorizedScanner { .. }))
    ));
    assert_eq!(
        service.get_order_status(&order_id).await.unwrap().status,
        OrderStatus::InDelivery
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_buyer_typing_delivery_code_too_early_gets_mismatch() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;

    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await
        .unwrap();
    for payload in [delivery.as_str(), code_of(&delivery)] {
        assert_eq!(
            service
                .submit_confirmation_scan(&order_id, payload, ScannerRole::Buyer)
                .await,
            Err(FulfillmentError::Order(OrderError::CodeMismatch))
        );
    }
    assert_eq!(
        service.get_order_status(&order_id).await.unwrap().status,
        OrderStatus::AwaitingPickup
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_scans_of_one_code_have_one_winner() {
    let (system, gateway) = start(config(20));
    let order_id = ready_for_pickup(&system.service, &gateway, "vendor_1").await;
    let pickup = system
        .service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let service = system.service.clone();
        let order_id = order_id.clone();
        let pickup = pickup.clone();
        tasks.push(tokio::spawn(async move {
            service
                .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
                .await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(status) => {
                assert_eq!(status, OrderStatus::InDelivery);
                accepted += 1;
            }
            Err(e) => assert_eq!(
                e,
                FulfillmentError::Order(OrderError::CodeAlreadyConsumed(CodeKind::Pickup))
            ),
        }
    }
    assert_eq!(accepted, 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_racing_payment_confirmation_has_one_winner() {
    let (system, gateway) = start(FulfillmentConfig {
        payment: PaymentPolicy {
            poll_interval: Duration::from_millis(1),
            max_attempts: 20,
        },
        scan_debounce: Duration::ZERO,
        ..FulfillmentConfig::default()
    });

    for n in 0..10 {
        gateway.queue(PaymentScript::new().then_paid());
        let vendor = format!("vendor_{}", n);
        let order_id = place(&system.service, &vendor).await;
        if n % 2 == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        match system.service.cancel_order(&order_id).await {
            Ok(status) => {
                assert_eq!(status, OrderStatus::Cancelled);
                let snapshot = system.service.get_order_status(&order_id).await.unwrap();
                assert_eq!(snapshot.status, OrderStatus::Cancelled);
                assert!(!snapshot.codes_issued);
                let balance = system
                    .service
                    .get_vendor_balance(&VendorId::from(vendor.as_str()))
                    .await
                    .unwrap();
                assert_eq!(balance.held, Decimal::ZERO);
            }
            Err(FulfillmentError::Order(OrderError::InvalidTransition { .. })) => {
                assert_eq!(
                    settled(&system.service, &order_id).await.status,
                    OrderStatus::AwaitingPickup
                );
            }
            Err(other) => panic!("unexpected {:?}", other),
        }
    }

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_identical_scan_within_window_is_dropped() {
    let (system, gateway) = start(FulfillmentConfig {
        scan_debounce: Duration::from_secs(5),
        ..config(20)
    });
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;

    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, "not a code", ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Decode(DecodeError::NotACode))
    );
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, "not a code", ScannerRole::Rider)
            .await,
        Err(FulfillmentError::DuplicateScan)
    );

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rescan_with_default_window() {
    let (system, gateway) = start(FulfillmentConfig {
        payment: PaymentPolicy {
            poll_interval: Duration::from_millis(5),
            max_attempts: 20,
        },
        ..FulfillmentConfig::default()
    });
    let service = &system.service;
    let order_id = ready_for_pickup(service, &gateway, "vendor_1").await;
    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await
        .unwrap();

    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await
            .unwrap(),
        OrderStatus::InDelivery
    );
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await,
        Err(FulfillmentError::DuplicateScan)
    );

    tokio::time::sleep(FulfillmentConfig::default().scan_debounce + Duration::from_millis(100))
        .await;
    assert_eq!(
        service
            .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Order(OrderError::CodeAlreadyConsumed(
            CodeKind::Pickup
        )))
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_charge_request_fails_the_order() {
    let (system, gateway) = start(config(20));
    let service = &system.service;
    gateway.fail_next_initiation("wallet not registered");

    let result = service
        .place_order(
            BuyerId::from("buyer_1"),
            VendorId::from("vendor_1"),
            vec![LineItem::new("sku", 1, Decimal::from(100))],
            Decimal::from(100),
        )
        .await;
    let order_id = match result {
        Err(FulfillmentError::Payment(PaymentError::Initiation { order_id, .. })) => order_id,
        other => panic!("unexpected {:?}", other),
    };

    let snapshot = service.get_order_status(&order_id).await.unwrap();
    assert_eq!(snapshot.status, OrderStatus::PaymentFailed);
    assert!(matches!(
        snapshot.payment_failure,
        Some(PaymentFailure::InitiationFailed(_))
    ));
    assert_eq!(service.active_payment_watches(), 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_carts_and_unknown_orders() {
    let (system, _gateway) = start(config(20));
    let service = &system.service;

    let empty = service
        .place_order(
            BuyerId::from("buyer_1"),
            VendorId::from("vendor_1"),
            vec![],
            Decimal::from(100),
        )
        .await;
    assert!(matches!(
        empty,
        Err(FulfillmentError::Order(OrderError::ValidationError(_)))
    ));

    let ghost = OrderId::from("ghost");
    assert_eq!(
        service.get_order_status(&ghost).await,
        Err(FulfillmentError::Order(OrderError::NotFound("ghost".into())))
    );
    assert!(matches!(
        service
            .submit_confirmation_scan(&ghost, "K7QM2XWD", ScannerRole::Rider)
            .await,
        Err(FulfillmentError::Order(OrderError::NotFound(_)))
    ));
    assert!(system.orders.get(ghost).await.unwrap().is_none());

    system.shutdown().await.unwrap();
}
