//! Favorites Core - Shared types library.
//!
//! This crate provides the types shared by the favorites storefront and its
//! tests:
//! - [`Gid`] - validated `gid://namespace/Resource/id` identifiers
//! - Record id newtypes extracted from gids
//! - [`Favorite`], [`CatalogItem`] and the merged favorites view
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
