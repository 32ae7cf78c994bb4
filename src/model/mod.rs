//! Plain data records. [`Order`] and [`VendorAccount`] are hosted as actors by
//! [`crate::order_actor`] and [`crate::ledger`].

pub mod code;
pub mod escrow;
pub mod ids;
pub mod order;

pub use code::*;
pub use escrow::*;
pub use ids::*;
pub use order::*;
