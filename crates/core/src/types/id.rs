//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Every ID wraps a
//! BSON `ObjectId`, the identifier format the document store assigns to
//! top-level and embedded records alike.
//!
//! Controllers parse client-supplied identifiers through `parse` before
//! any lookup; a malformed identifier is rejected at the boundary without
//! touching storage.

/// Error returned when a client-supplied identifier is not a valid
/// 24-character hex `ObjectId`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {entity} id")]
pub struct InvalidId {
    /// The entity kind the identifier was supposed to reference.
    pub entity: &'static str,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`ObjectId`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` validating the 24-hex wire format
/// - `new()` generating a fresh identifier
/// - `From<ObjectId>` and `Into<ObjectId>` implementations
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(CartId, "cart");
/// define_id!(CouponId, "coupon");
///
/// let cart_id = CartId::new();
/// let coupon_id = CouponId::new();
///
/// // These are different types, so this won't compile:
/// // let _: CartId = coupon_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::bson::oid::ObjectId);

        impl $name {
            /// Generate a fresh identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(::bson::oid::ObjectId::new())
            }

            /// Parse a client-supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns `InvalidId` if the input is not a valid
            /// 24-character hex `ObjectId`.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::InvalidId> {
                ::bson::oid::ObjectId::parse_str(s)
                    .map(Self)
                    .map_err(|_| $crate::types::id::InvalidId { entity: $entity })
            }

            /// Get the underlying `ObjectId`.
            #[must_use]
            pub const fn as_object_id(&self) -> ::bson::oid::ObjectId {
                self.0
            }
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0.to_hex())
            }
        }

        impl From<::bson::oid::ObjectId> for $name {
            fn from(id: ::bson::oid::ObjectId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::bson::oid::ObjectId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for ::bson::Bson {
            fn from(id: $name) -> Self {
                ::bson::Bson::ObjectId(id.0)
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId, "user");
define_id!(StoreId, "store");
define_id!(ItemId, "item");
define_id!(OrderId, "order");
define_id!(PaymentId, "payment");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_hex() {
        let id = UserId::parse("65f1a2b3c4d5e6f708192a3b").unwrap();
        assert_eq!(id.to_string(), "65f1a2b3c4d5e6f708192a3b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("not-an-object-id").is_err());
        // Too short
        assert!(UserId::parse("65f1a2b3").is_err());
        // Non-hex characters of the right length
        assert!(UserId::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn test_parse_error_names_entity() {
        let err = StoreId::parse("bogus").unwrap_err();
        assert_eq!(err.to_string(), "invalid store id");
    }

    #[test]
    fn test_serde_embeds_hex() {
        let id = ItemId::parse("65f1a2b3c4d5e6f708192a3b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.contains("65f1a2b3c4d5e6f708192a3b"));
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        assert_ne!(OrderId::new(), OrderId::new());
    }
}
