//! Typed ID wrappers for compile-time type safety.
//!
//! Every record carries a surrogate 64-bit identity assigned by the store.
//! These wrappers prevent a `ProductId` from being passed where a `CartId`
//! is expected while staying transparent on the wire and in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Macro to generate typed ID wrappers with common trait implementations.
macro_rules! typed_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
            ToSchema,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identity value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identity value.
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(ProductSizeId, "Unique identifier for a product size variant.");
typed_id!(CartId, "Unique identifier for a cart.");
typed_id!(CartItemId, "Unique identifier for a cart line item.");
typed_id!(TransactionId, "Unique identifier for a checkout transaction.");
typed_id!(TransactionItemId, "Unique identifier for a transaction line item.");
typed_id!(VoucherId, "Unique identifier for a voucher.");
typed_id!(UserVoucherId, "Unique identifier for a redeemed voucher claim.");
typed_id!(WishlistId, "Unique identifier for a wishlist.");
typed_id!(HomepageId, "Unique identifier for a homepage grouping.");
typed_id!(SupportTicketId, "Unique identifier for a support ticket.");
typed_id!(ChatId, "Unique identifier for a chat message.");
typed_id!(ActivityLogId, "Unique identifier for an activity log entry.");
