//! Typed IDs for type-safe document references.
//!
//! Using typed IDs prevents accidentally passing a `ReceiptId` where an `InvoiceId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Derives a stable ID from a tenant-scoped natural key (UUID v5).
            ///
            /// The same tenant and key always yield the same ID, which makes
            /// retried imports idempotent.
            #[must_use]
            pub fn from_natural_key(tenant: TenantId, key: &str) -> Self {
                Self(Uuid::new_v5(&tenant.0, key.as_bytes()))
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant (organization).");
typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(ProductId, "Unique identifier for a catalog product.");
typed_id!(InvoiceId, "Unique identifier for an invoice.");
typed_id!(ReceiptId, "Unique identifier for a payment receipt.");
typed_id!(MovementId, "Unique identifier for a cash or current-account movement.");
typed_id!(QuoteId, "Unique identifier for a quote.");
typed_id!(PriceListId, "Unique identifier for a price list.");
typed_id!(LeadId, "Unique identifier for a sales lead.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
