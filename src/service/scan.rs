use crate::model::OrderId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Drops a payload resubmitted for the same order within the window. Cameras report the same
/// QR code many times per second.
pub struct ScanDebouncer {
    window: Duration,
    recent: Mutex<HashMap<(OrderId, String), Instant>>,
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Records the scan and reports whether an identical one was seen within the window.
    pub fn is_duplicate(&self, order_id: &OrderId, payload: &str) -> bool {
        if self.window.is_zero() {
            return false;
        }
        let now = Instant::now();
        let mut recent = self.recent.lock();
        recent.retain(|_, seen| now.duration_since(*seen) < self.window);
        recent
            .insert((order_id.clone(), payload.trim().to_string()), now)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_is_per_order_and_payload() {
        let debouncer = ScanDebouncer::new(Duration::from_secs(60));
        let o1 = OrderId::from("o1");
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWD"));
        assert!(debouncer.is_duplicate(&o1, " K7QM2XWD "));
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWE"));
        assert!(!debouncer.is_duplicate(&OrderId::from("o2"), "K7QM2XWD"));
    }

    #[test]
    fn test_window_expires() {
        let debouncer = ScanDebouncer::new(Duration::from_millis(10));
        let o1 = OrderId::from("o1");
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWD"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWD"));
    }

    #[test]
    fn test_zero_window_disables_debounce() {
        let debouncer = ScanDebouncer::new(Duration::ZERO);
        let o1 = OrderId::from("o1");
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWD"));
        assert!(!debouncer.is_duplicate(&o1, "K7QM2XWD"));
    }
}
