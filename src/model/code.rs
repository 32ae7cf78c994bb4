use crate::model::OrderId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which handoff a confirmation code proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeKind {
    /// Vendor → rider.
    Pickup,
    /// Rider → buyer.
    Delivery,
}

impl CodeKind {
    /// Single-letter tag used in scan payloads.
    pub fn tag(self) -> char {
        match self {
            CodeKind::Pickup => 'P',
            CodeKind::Delivery => 'D',
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "P" | "p" => Some(CodeKind::Pickup),
            "D" | "d" => Some(CodeKind::Delivery),
            _ => None,
        }
    }
}

impl Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeKind::Pickup => f.write_str("pickup"),
            CodeKind::Delivery => f.write_str("delivery"),
        }
    }
}

/// Who is holding the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScannerRole {
    Buyer,
    Vendor,
    Rider,
}

impl ScannerRole {
    /// Pickup is confirmed at the vendor's counter, delivery at the buyer's door. The rider is
    /// present at both.
    pub fn may_confirm(self, kind: CodeKind) -> bool {
        matches!(
            (self, kind),
            (ScannerRole::Rider, _)
                | (ScannerRole::Vendor, CodeKind::Pickup)
                | (ScannerRole::Buyer, CodeKind::Delivery)
        )
    }
}

impl Display for ScannerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScannerRole::Buyer => f.write_str("buyer"),
            ScannerRole::Vendor => f.write_str("vendor"),
            ScannerRole::Rider => f.write_str("rider"),
        }
    }
}

/// A single-use secret proving that a physical handoff happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationCode {
    pub value: String,
    pub kind: CodeKind,
    pub order_id: OrderId,
    pub consumed: bool,
    pub issued_at: DateTime<Utc>,
}

impl ConfirmationCode {
    pub fn new(value: impl Into<String>, kind: CodeKind, order_id: OrderId) -> Self {
        Self {
            value: value.into(),
            kind,
            order_id,
            consumed: false,
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, validity: Duration, now: DateTime<Utc>) -> bool {
        now > self.issued_at + validity
    }

    /// Compares the secret without short-circuiting on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let (a, b) = (self.value.as_bytes(), candidate.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
