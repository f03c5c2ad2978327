//! Catalog projections used by the favorites page.

use serde::{Deserialize, Serialize};

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Catalog image ID.
    pub id: Option<String>,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image URL.
    pub url: String,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// Display-ready projection of a sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Product gid.
    pub id: String,
    /// URL handle (e.g. `cool-shirt`).
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image, if the product has one.
    pub featured_image: Option<Image>,
}

/// A favorite resolved against the catalog.
///
/// Serializes flat: the catalog item's fields plus `favoriteId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    /// Id of the favorite record this entry came from.
    pub favorite_id: String,
    /// Resolved catalog item.
    #[serde(flatten)]
    pub item: CatalogItem,
}

/// A customer's favorites in the order the favorites service returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedFavoriteView {
    /// Resolved favorites; unresolved ones are absent.
    pub favorites: Vec<FavoriteItem>,
}

impl MergedFavoriteView {
    /// Returns `true` if no favorite resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Number of resolved favorites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    /// Iterate over the resolved catalog items in order.
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.favorites.iter().map(|f| &f.item)
    }
}
