//! GraphQL documents and response shapes for the Storefront API.

use serde::{Deserialize, Serialize};

use favorites_core::Image;

/// Batch product lookup used by the favorites page.
///
/// `nodes` answers `null` for unknown ids and `{}` for ids of other types;
/// neither is an error.
pub const PRODUCTS_BY_IDS_QUERY: &str = r"
    query ProductsByIds($ids: [ID!]!) {
        nodes(ids: $ids) {
            ... on Product {
                ...ProductItem
            }
        }
    }

    fragment ProductItem on Product {
        id
        handle
        title
        featuredImage {
            id
            altText
            url
            width
            height
        }
    }
";

/// Variables for [`PRODUCTS_BY_IDS_QUERY`].
#[derive(Debug, Serialize)]
pub struct ProductsByIdsVariables<'a> {
    pub ids: &'a [String],
}

/// `data` of a [`PRODUCTS_BY_IDS_QUERY`] response.
#[derive(Debug, Deserialize)]
pub struct ProductsByIdsData {
    pub nodes: Vec<Option<ProductNode>>,
}

/// One entry of `nodes`; every field is absent for non-product nodes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: Option<String>,
    pub handle: Option<String>,
    pub title: Option<String>,
    pub featured_image: Option<Image>,
}
