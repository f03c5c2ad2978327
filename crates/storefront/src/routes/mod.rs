//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Health check
//!
//! # Account (requires Shopify customer)
//! GET    /account/favorites    - Favorites resolved against the catalog (JSON)
//! DELETE /account/favorites    - Remove a favorite (form field `favoriteId`)
//! ```

pub mod favorites;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/favorites",
        get(favorites::index).delete(favorites::remove),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/account", account_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
