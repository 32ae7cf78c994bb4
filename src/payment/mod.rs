//! # Payments
//!
//! The mobile-money side of checkout: the [`PaymentGateway`] seam to the processor, the
//! [`PaymentCoordinator`] that watches charges until they settle, and [`ScriptedGateway`], an
//! in-memory processor for demos and tests.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod scripted;

pub use coordinator::*;
pub use error::*;
pub use gateway::*;
pub use scripted::*;
