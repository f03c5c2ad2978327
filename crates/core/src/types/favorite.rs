//! Favorite records as returned by the favorites service.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::gid::Gid;

/// A record linking a customer to a catalog product.
///
/// Created and owned by the favorites service. This system only reads
/// favorites or asks for their deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Favorite identity, usually a `gid://.../Favorite/{id}` string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Product record id (e.g. `42`) or a full product gid.
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    /// Owning customer's record id.
    #[serde(deserialize_with = "string_or_number")]
    pub customer_id: String,
}

impl Favorite {
    /// Catalog identifier to look this favorite's product up by.
    ///
    /// Total and deterministic: a `productId` that already is a gid is used
    /// unchanged, anything else is wrapped as `gid://shopify/Product/{id}`.
    #[must_use]
    pub fn catalog_id(&self) -> String {
        if self.product_id.starts_with(Gid::SCHEME) {
            return self.product_id.clone();
        }
        Gid::shopify_product(&self.product_id).map_or_else(
            |_| format!("{}{}/Product/{}", Gid::SCHEME, Gid::SHOPIFY, self.product_id),
            String::from,
        )
    }
}

/// Services that key by integer send numbers; accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let favorite: Favorite = serde_json::from_str(
            r#"{"id":"gid://shopify/Favorite/9","productId":"42","customerId":"7"}"#,
        )
        .unwrap();
        assert_eq!(favorite.id, "gid://shopify/Favorite/9");
        assert_eq!(favorite.product_id, "42");
        assert_eq!(favorite.customer_id, "7");
    }

    #[test]
    fn test_deserialize_numeric_ids() {
        let favorite: Favorite =
            serde_json::from_str(r#"{"id":9,"productId":42,"customerId":7}"#).unwrap();
        assert_eq!(favorite.id, "9");
        assert_eq!(favorite.product_id, "42");
    }

    #[test]
    fn test_catalog_id_from_record_id() {
        let favorite = Favorite {
            id: "gid://shopify/Favorite/9".to_string(),
            product_id: "42".to_string(),
            customer_id: "7".to_string(),
        };
        assert_eq!(favorite.catalog_id(), "gid://shopify/Product/42");
    }

    #[test]
    fn test_catalog_id_keeps_existing_gid() {
        let favorite = Favorite {
            id: "1".to_string(),
            product_id: "gid://shopify/Product/42".to_string(),
            customer_id: "7".to_string(),
        };
        assert_eq!(favorite.catalog_id(), "gid://shopify/Product/42");
    }

    #[test]
    fn test_catalog_id_parses_as_product_gid() {
        let favorite = Favorite {
            id: "gid://shopify/Favorite/9".to_string(),
            product_id: "8123456789".to_string(),
            customer_id: "7".to_string(),
        };
        let gid = Gid::parse(&favorite.catalog_id()).unwrap();
        assert_eq!(gid, Gid::shopify_product("8123456789").unwrap());
    }

    #[test]
    fn test_catalog_id_wraps_unusual_record_id_verbatim() {
        let favorite = Favorite {
            id: "1".to_string(),
            product_id: "42 b".to_string(),
            customer_id: "7".to_string(),
        };
        assert_eq!(favorite.catalog_id(), "gid://shopify/Product/42 b");
    }
}
