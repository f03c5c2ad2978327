//! Newtype record ids for type-safe service references.
//!
//! A record id is the final segment of a [`Gid`]: the identifier the owning
//! service understands in its own URLs. Use the `define_record_id!` macro to
//! create wrappers that prevent mixing ids of different resources.

use crate::types::gid::{Gid, GidError};

/// Macro to define a type-safe record id wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `from_gid()` / `parse_gid()` which check the gid names the expected resource
/// - `as_str()` and `Display`
///
/// # Example
///
/// ```rust
/// # use favorites_core::define_record_id;
/// define_record_id!(OrderRecordId, "Order");
///
/// let id = OrderRecordId::parse_gid("gid://shopify/Order/5").unwrap();
/// assert_eq!(id.as_str(), "5");
/// assert!(OrderRecordId::parse_gid("gid://shopify/Product/5").is_err());
/// ```
#[macro_export]
macro_rules! define_record_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Resource name this id belongs to.
            pub const RESOURCE: &'static str = $resource;

            /// Extract the record id from a gid of this resource.
            ///
            /// # Errors
            ///
            /// Returns an error if the gid names a different resource.
            pub fn from_gid(gid: &$crate::Gid) -> ::core::result::Result<Self, $crate::GidError> {
                if gid.resource() != Self::RESOURCE {
                    return Err($crate::GidError::ResourceMismatch {
                        expected: Self::RESOURCE,
                        found: gid.resource().to_owned(),
                    });
                }
                Ok(Self(gid.record_id().to_owned()))
            }

            /// Parse a gid string and extract the record id.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a well-formed gid of
            /// this resource.
            pub fn parse_gid(s: &str) -> ::core::result::Result<Self, $crate::GidError> {
                Self::from_gid(&$crate::Gid::parse(s)?)
            }

            /// Returns the record id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_record_id!(CustomerRecordId, "Customer");
define_record_id!(FavoriteRecordId, "Favorite");

impl TryFrom<&Gid> for CustomerRecordId {
    type Error = GidError;

    fn try_from(gid: &Gid) -> Result<Self, Self::Error> {
        Self::from_gid(gid)
    }
}

impl TryFrom<&Gid> for FavoriteRecordId {
    type Error = GidError;

    fn try_from(gid: &Gid) -> Result<Self, Self::Error> {
        Self::from_gid(gid)
    }
}
