//! Conversions from Storefront API response shapes to domain types.

use favorites_core::CatalogItem;

use super::queries::ProductNode;

/// Convert a `nodes` entry to a catalog item.
///
/// Returns `None` for nodes that did not match the `Product` fragment.
pub fn convert_product_node(node: ProductNode) -> Option<CatalogItem> {
    Some(CatalogItem {
        id: node.id?,
        handle: node.handle?,
        title: node.title?,
        featured_image: node.featured_image,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_product_node() {
        let node = ProductNode {
            id: Some("gid://shopify/Product/42".to_string()),
            handle: Some("cool-shirt".to_string()),
            title: Some("Cool Shirt".to_string()),
            featured_image: None,
        };
        let item = convert_product_node(node).unwrap();
        assert_eq!(item.handle, "cool-shirt");
    }

    #[test]
    fn test_convert_non_product_node() {
        assert!(convert_product_node(ProductNode::default()).is_none());
    }
}
