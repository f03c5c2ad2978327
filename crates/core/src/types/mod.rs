//! Core types for the favorites storefront.
//!
//! This module provides type-safe wrappers for identifiers and the read-only
//! records exchanged with the favorites and catalog services.

pub mod catalog;
pub mod favorite;
pub mod gid;
pub mod id;

pub use catalog::{CatalogItem, FavoriteItem, Image, MergedFavoriteView};
pub use favorite::Favorite;
pub use gid::{Gid, GidError};
pub use id::*;
