//! # Confirmation Codes
//!
//! Minting ([`CodeIssuer`]) and reading ([`QrCodec`]) the single-use codes that prove each of the
//! two physical handoffs. Neither component touches order state: attaching a minted pair to an
//! order and consuming a scanned code are transitions of the order actor.

pub mod issuer;
pub mod qr;

pub use issuer::*;
pub use qr::*;
