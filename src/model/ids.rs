//! Type-safe identifiers.
//!
//! Every party in the protocol is addressed by an opaque string. Wrapping each in its own
//! newtype keeps a `VendorId` from being passed where an `OrderId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of an order. Freshly minted ids are random UUIDs.
    OrderId
);
string_id!(BuyerId);
string_id!(VendorId);
string_id!(RiderId);
string_id!(
    /// Processor-side reference of a charge request.
    PaymentRef
);

impl OrderId {
    /// Mints a new, unguessable order id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_order_ids_are_distinct_and_compact() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.as_str().contains(':'), "ids must not collide with the payload separator");
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = VendorId::from("vendor_7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"vendor_7\"");
    }
}
