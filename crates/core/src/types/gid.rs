//! Global identifier type.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Gid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The input string is empty.
    #[error("gid cannot be empty")]
    Empty,
    /// The input does not start with `gid://`.
    #[error("gid must start with gid://")]
    MissingScheme,
    /// A required path segment is missing or empty.
    #[error("gid is missing its {0} segment")]
    MissingSegment(&'static str),
    /// The gid has more path segments than `namespace/Resource/id`.
    #[error("gid has unexpected trailing segments")]
    TrailingSegments,
    /// The record id contains characters outside `[A-Za-z0-9_-]`.
    #[error("gid record id {0:?} contains invalid characters")]
    InvalidRecordId(String),
    /// The gid names a different resource than the one expected.
    #[error("expected a {expected} gid, got {found}")]
    ResourceMismatch {
        /// Resource the caller asked for.
        expected: &'static str,
        /// Resource found in the gid.
        found: String,
    },
}

/// A global identifier of the form `gid://{namespace}/{Resource}/{id}`.
///
/// The final segment is the record id understood by the service that owns
/// the resource. It is restricted to ASCII alphanumerics, `-` and `_` so it
/// can be placed in a URL path without escaping.
///
/// ## Examples
///
/// ```
/// use favorites_core::Gid;
///
/// let gid = Gid::parse("gid://shopify/Product/42").unwrap();
/// assert_eq!(gid.namespace(), "shopify");
/// assert_eq!(gid.resource(), "Product");
/// assert_eq!(gid.record_id(), "42");
///
/// assert!(Gid::parse("gid://shopify/Product").is_err());
/// assert!(Gid::parse("shopify/Product/42").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gid {
    namespace: String,
    resource: String,
    record_id: String,
}

impl Gid {
    /// URI scheme prefix shared by every gid.
    pub const SCHEME: &'static str = "gid://";

    /// Namespace used for Shopify-owned resources.
    pub const SHOPIFY: &'static str = "shopify";

    /// Build a gid from its parts, validating each one.
    ///
    /// # Errors
    ///
    /// Returns an error if any part is empty, contains `/`, or if the record
    /// id contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(namespace: &str, resource: &str, record_id: &str) -> Result<Self, GidError> {
        let namespace = non_empty_segment(namespace, "namespace")?;
        let resource = non_empty_segment(resource, "resource")?;
        let record_id = non_empty_segment(record_id, "record id")?;

        if !record_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(GidError::InvalidRecordId(record_id.to_owned()));
        }

        Ok(Self {
            namespace: namespace.to_owned(),
            resource: resource.to_owned(),
            record_id: record_id.to_owned(),
        })
    }

    /// Parse a gid string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, lacks the `gid://` scheme,
    /// is missing a segment, has extra segments, or has an invalid record id.
    pub fn parse(s: &str) -> Result<Self, GidError> {
        if s.is_empty() {
            return Err(GidError::Empty);
        }

        let path = s.strip_prefix(Self::SCHEME).ok_or(GidError::MissingScheme)?;
        let mut segments = path.split('/');

        let namespace = segments.next().unwrap_or_default();
        let resource = segments.next().ok_or(GidError::MissingSegment("resource"))?;
        let record_id = segments.next().ok_or(GidError::MissingSegment("record id"))?;

        if segments.next().is_some() {
            return Err(GidError::TrailingSegments);
        }

        Self::new(namespace, resource, record_id)
    }

    /// Gid of a Shopify product with the given numeric id.
    ///
    /// # Errors
    ///
    /// Returns an error if `product_id` is not a valid record id.
    pub fn shopify_product(product_id: &str) -> Result<Self, GidError> {
        Self::new(Self::SHOPIFY, "Product", product_id)
    }

    /// Returns the namespace (e.g. `shopify`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the resource type (e.g. `Product`).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the final segment: the owning service's record id.
    #[must_use]
    pub fn record_id(&self) -> &str {
        &self.record_id
    }
}

fn non_empty_segment<'a>(value: &'a str, name: &'static str) -> Result<&'a str, GidError> {
    if value.is_empty() || value.contains('/') {
        return Err(GidError::MissingSegment(name));
    }
    Ok(value)
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}/{}",
            Self::SCHEME,
            self.namespace,
            self.resource,
            self.record_id
        )
    }
}

impl FromStr for Gid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Gid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Gid> for String {
    fn from(gid: Gid) -> Self {
        gid.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let gid = Gid::parse("gid://shopify/Favorite/9").unwrap();
        assert_eq!(gid.namespace(), "shopify");
        assert_eq!(gid.resource(), "Favorite");
        assert_eq!(gid.record_id(), "9");
    }

    #[test]
    fn test_parse_opaque_record_id() {
        let gid = Gid::parse("gid://favorites/Favorite/a1b2-c3_d4").unwrap();
        assert_eq!(gid.record_id(), "a1b2-c3_d4");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Gid::parse(""), Err(GidError::Empty));
    }

    #[test]
    fn test_parse_missing_scheme() {
        assert_eq!(Gid::parse("shopify/Favorite/9"), Err(GidError::MissingScheme));
        assert_eq!(Gid::parse("9"), Err(GidError::MissingScheme));
    }

    #[test]
    fn test_parse_missing_record_id() {
        assert_eq!(
            Gid::parse("gid://shopify/Favorite"),
            Err(GidError::MissingSegment("record id"))
        );
        assert_eq!(
            Gid::parse("gid://shopify/Favorite/"),
            Err(GidError::MissingSegment("record id"))
        );
    }

    #[test]
    fn test_parse_missing_namespace() {
        assert_eq!(
            Gid::parse("gid:///Favorite/9"),
            Err(GidError::MissingSegment("namespace"))
        );
    }

    #[test]
    fn test_parse_trailing_segments() {
        assert_eq!(
            Gid::parse("gid://shopify/Favorite/9/extra"),
            Err(GidError::TrailingSegments)
        );
    }

    #[test]
    fn test_parse_invalid_record_id() {
        assert!(matches!(
            Gid::parse("gid://shopify/Favorite/9?x=1"),
            Err(GidError::InvalidRecordId(_))
        ));
        assert!(matches!(
            Gid::parse("gid://shopify/Favorite/../9"),
            Err(GidError::TrailingSegments)
        ));
    }

    #[test]
    fn test_display() {
        let gid = Gid::shopify_product("42").unwrap();
        assert_eq!(gid.to_string(), "gid://shopify/Product/42");
    }

    #[test]
    fn test_serde_as_string() {
        let gid = Gid::parse("gid://shopify/Customer/7").unwrap();
        let json = serde_json::to_string(&gid).unwrap();
        assert_eq!(json, "\"gid://shopify/Customer/7\"");

        let parsed: Gid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, gid);

        assert!(serde_json::from_str::<Gid>("\"gid://shopify\"").is_err());
    }
}
