//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
//!
//! Every log line carries the ids it concerns as structured fields (`order_id`, `vendor_id`,
//! `attempt`, `status`), and each payment watch runs inside a `payment_watch` span, so one
//! order's story can be pulled out of an interleaved log.
//!
//! ```bash
//! RUST_LOG=info cargo run      # transitions, escrow movements, settled payments
//! RUST_LOG=debug cargo run     # every poll and actor message
//! ```
//!
//! With `RUST_LOG=info` a delivered order reads:
//!
//! ```text
//! INFO place_order: Charge requested reference=pay_1
//! INFO Order transitioned order_id=… from=Created to=PaymentPending
//! INFO payment_watch: Payment confirmed attempt=3
//! INFO payment_watch: Escrow held vendor_id=vendor_1 amount=1500 held=1500
//! INFO payment_watch: Codes issued outstanding=1
//! INFO submit_confirmation_scan: Handoff confirmed kind=pickup status=InDelivery
//! INFO submit_confirmation_scan: Escrow released vendor_id=vendor_1 amount=1500 available=1500
//! ```
//!
//! Code values are never logged.

/// Initializes the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
