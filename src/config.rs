//! Runtime settings: defaults, overridable from the environment (or a `.env` file).

use dotenvy::dotenv;
use std::time::Duration;
use thiserror::Error;

pub const ENV_POLL_INTERVAL_MS: &str = "FULFILLMENT_POLL_INTERVAL_MS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "FULFILLMENT_POLL_MAX_ATTEMPTS";
pub const ENV_CODE_LENGTH: &str = "FULFILLMENT_CODE_LENGTH";
pub const ENV_CODE_VALIDITY_SECS: &str = "FULFILLMENT_CODE_VALIDITY_SECS";
pub const ENV_SCAN_DEBOUNCE_MS: &str = "FULFILLMENT_SCAN_DEBOUNCE_MS";
pub const ENV_MAILBOX_CAPACITY: &str = "FULFILLMENT_MAILBOX_CAPACITY";

const MAX_CODE_VALIDITY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
    #[error("{0}")]
    OutOfRange(String),
}

/// How long to wait on a pending charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPolicy {
    /// Wait before each poll.
    pub poll_interval: Duration,
    /// Polls before giving up with a timeout.
    pub max_attempts: u32,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePolicy {
    /// Characters per code. Each carries 5 bits.
    pub length: usize,
    /// Age after which an unused code stops verifying.
    pub validity: Duration,
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            length: 8,
            validity: Duration::from_secs(72 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentConfig {
    pub payment: PaymentPolicy,
    pub codes: CodePolicy,
    /// Identical scans of one order within this window are dropped. Zero disables it.
    pub scan_debounce: Duration,
    /// Request buffer of each actor's router.
    pub mailbox_capacity: usize,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            payment: PaymentPolicy::default(),
            codes: CodePolicy::default(),
            scan_debounce: Duration::from_millis(750),
            mailbox_capacity: 32,
        }
    }
}

impl FulfillmentConfig {
    /// Defaults overridden by `FULFILLMENT_*` variables, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let config = Self::from_lookup(|var| std::env::var(var).ok())?;
        tracing::info!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Builds a config from any variable source; unset variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse::<u64>(&lookup, ENV_POLL_INTERVAL_MS)? {
            config.payment.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse(&lookup, ENV_POLL_MAX_ATTEMPTS)? {
            config.payment.max_attempts = attempts;
        }
        if let Some(length) = parse(&lookup, ENV_CODE_LENGTH)? {
            config.codes.length = length;
        }
        if let Some(secs) = parse::<u64>(&lookup, ENV_CODE_VALIDITY_SECS)? {
            config.codes.validity = Duration::from_secs(secs);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_SCAN_DEBOUNCE_MS)? {
            config.scan_debounce = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse(&lookup, ENV_MAILBOX_CAPACITY)? {
            config.mailbox_capacity = capacity;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payment.max_attempts == 0 {
            return Err(ConfigError::OutOfRange("poll max attempts must be at least 1".into()));
        }
        if !(6..=16).contains(&self.codes.length) {
            return Err(ConfigError::OutOfRange(format!(
                "code length must be between 6 and 16, got {}",
                self.codes.length
            )));
        }
        if self.codes.validity.is_zero() || self.codes.validity > MAX_CODE_VALIDITY {
            return Err(ConfigError::OutOfRange(format!(
                "code validity must be between 1s and {}s",
                MAX_CODE_VALIDITY.as_secs()
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::OutOfRange("mailbox capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// The code validity as the `chrono` duration the state machine compares timestamps with.
    pub fn code_validity(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.codes.validity.min(MAX_CODE_VALIDITY))
            .unwrap_or_else(|_| chrono::Duration::days(365))
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
