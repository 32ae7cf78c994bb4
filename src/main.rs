//! Runs one order end to end against the scripted processor and prints the result as JSON.

use fulfillment::lifecycle::setup_tracing;
use fulfillment::model::{
    BuyerId, CodeKind, LineItem, OrderStatus, RiderId, ScannerRole, VendorId,
};
use fulfillment::payment::{PaymentScript, ScriptedGateway};
use fulfillment::{FulfillmentConfig, FulfillmentSystem};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let mut config = FulfillmentConfig::from_env()?;
    config.payment.poll_interval = config.payment.poll_interval.min(Duration::from_millis(200));

    // The buyer approves the prompt on the third poll.
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.queue(PaymentScript::new().pending(2).then_paid());

    let system = FulfillmentSystem::new(config, gateway)?;
    let service = system.service.clone();
    let vendor_id = VendorId::from("vendor_mama_ada");

    let placed = service
        .place_order(
            BuyerId::from("buyer_kofi"),
            vendor_id.clone(),
            vec![
                LineItem::new("jollof_rice_large", 2, Decimal::from(600)),
                LineItem::new("chapman", 1, Decimal::from(300)),
            ],
            Decimal::from(1500),
        )
        .instrument(tracing::info_span!("checkout"))
        .await?;
    let order_id = placed.order_id;

    let mut status = placed.status;
    while status == OrderStatus::PaymentPending || status == OrderStatus::Paid {
        tokio::time::sleep(Duration::from_millis(100)).await;
        status = service.get_order_status(&order_id).await?.status;
    }
    info!(%order_id, %status, "Payment settled");

    service
        .assign_rider(&order_id, RiderId::from("rider_yaw"))
        .await?;

    let pickup = service
        .confirmation_payload(&order_id, CodeKind::Pickup)
        .await?;
    service
        .submit_confirmation_scan(&order_id, &pickup, ScannerRole::Rider)
        .instrument(tracing::info_span!("pickup"))
        .await?;

    let delivery = service
        .confirmation_payload(&order_id, CodeKind::Delivery)
        .await?;
    service
        .submit_confirmation_scan(&order_id, &delivery, ScannerRole::Buyer)
        .instrument(tracing::info_span!("delivery"))
        .await?;

    let snapshot = service.get_order_status(&order_id).await?;
    let balance = service.get_vendor_balance(&vendor_id).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!("{}", serde_json::to_string_pretty(&balance)?);

    drop(service);
    system.shutdown().await?;
    Ok(())
}
