//! Storefront favorites library.
//!
//! This crate provides the favorites pages as a library, allowing them to
//! be tested and reused. The binary in `main.rs` only wires configuration,
//! telemetry and the listener around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::MemoryStore;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// `session_store` is shared with whatever issues customer sessions.
pub fn app(state: AppState, session_store: MemoryStore) -> Router {
    let session_layer = middleware::create_session_layer(session_store, state.config());

    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
