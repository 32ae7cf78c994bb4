use crate::codes::ScannedCode;
use crate::model::{
    CodeKind, ConfirmationCode, OrderStatus, PaymentFailure, PaymentRef, RiderId, ScannerRole,
};
use chrono::{DateTime, Utc};

/// Events the order state machine accepts.
///
/// Variants that move `status` are the edges of the lifecycle; the rest are guarded bookkeeping
/// that never changes `status`.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// `Created → PaymentPending`. Requires a positive total and at least one item.
    BeginCheckout,
    /// Records the processor reference of the charge being polled. Once per order.
    AttachPaymentAttempt { reference: PaymentRef },
    /// Counts one poll of the pending charge.
    RecordPoll,
    /// `PaymentPending → Paid`, only for the reference of the attached attempt.
    ConfirmPayment { reference: PaymentRef },
    /// `PaymentPending → PaymentFailed`.
    FailPayment(PaymentFailure),
    /// `Paid → AwaitingPickup`, attaching the freshly minted pair.
    IssueCodes {
        pickup: ConfirmationCode,
        delivery: ConfirmationCode,
    },
    /// `AwaitingPickup → InDelivery` or `InDelivery → Delivered`, depending on the code.
    /// `role` must be allowed to confirm the handoff the matched code proves.
    VerifyCode {
        scan: ScannedCode,
        role: ScannerRole,
        now: DateTime<Utc>,
    },
    /// `Created | PaymentPending | PaymentFailed → Cancelled`.
    Cancel,
    AssignRider(RiderId),
    /// Flags the escrow of a delivered order as released.
    MarkEscrowReleased,
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone, PartialEq)]
pub enum OrderActionResult {
    BeginCheckout(OrderStatus),
    AttachPaymentAttempt(()),
    /// Number of polls recorded so far.
    RecordPoll(u32),
    ConfirmPayment(OrderStatus),
    FailPayment(OrderStatus),
    IssueCodes(OrderStatus),
    /// Which code was consumed and the state it moved the order to.
    VerifyCode(CodeKind, OrderStatus),
    Cancel(OrderStatus),
    AssignRider(()),
    /// `true` if this call flipped the flag, `false` if it was already set.
    MarkEscrowReleased(bool),
}
