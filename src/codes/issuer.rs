use crate::model::{CodeKind, ConfirmationCode, OrderId};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Symbols a code is drawn from: digits and upper-case letters minus the look-alikes `0 O 1 I`.
/// 32 symbols, so every character carries 5 bits.
pub const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// The pair minted for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCodes {
    pub pickup: ConfirmationCode,
    pub delivery: ConfirmationCode,
    /// `false` when the pair already existed and was returned as-is.
    pub fresh: bool,
}

/// Mints single-use confirmation codes from the operating system's CSPRNG.
///
/// Issuing is idempotent per order: a retried call returns the pair minted the first time, so
/// an upstream retry can never leave an order with two different sets of codes.
pub struct CodeIssuer {
    length: usize,
    issued: Mutex<HashMap<OrderId, (ConfirmationCode, ConfirmationCode)>>,
}

impl CodeIssuer {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            issued: Mutex::new(HashMap::new()),
        }
    }

    #[instrument(skip_all, fields(order_id = %order_id))]
    pub fn issue_codes(&self, order_id: &OrderId) -> IssuedCodes {
        let mut issued = self.issued.lock();
        if let Some((pickup, delivery)) = issued.get(order_id) {
            debug!("Codes already issued, returning existing pair");
            return IssuedCodes {
                pickup: pickup.clone(),
                delivery: delivery.clone(),
                fresh: false,
            };
        }

        let pickup_value = self.generate();
        let mut delivery_value = self.generate();
        while delivery_value == pickup_value {
            delivery_value = self.generate();
        }
        let pickup = ConfirmationCode::new(pickup_value, CodeKind::Pickup, order_id.clone());
        let delivery = ConfirmationCode::new(delivery_value, CodeKind::Delivery, order_id.clone());
        issued.insert(order_id.clone(), (pickup.clone(), delivery.clone()));
        info!(outstanding = issued.len(), "Codes issued");

        IssuedCodes {
            pickup,
            delivery,
            fresh: true,
        }
    }

    /// Forgets the pair of an order that reached a terminal state.
    pub fn revoke(&self, order_id: &OrderId) -> bool {
        self.issued.lock().remove(order_id).is_some()
    }

    pub fn outstanding(&self) -> usize {
        self.issued.lock().len()
    }

    fn generate(&self) -> String {
        let mut rng = OsRng;
        (0..self.length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}
