//! Integration tests for the storefront favorites service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p favorites-integration-tests
//! ```
//!
//! Every upstream is a `wiremock` server, so no credentials or running
//! services are needed.
//!
//! # Test Categories
//!
//! - `favorites_read` - `GET /account/favorites`
//! - `favorites_delete` - `DELETE /account/favorites`
//! - `query_cache` - Cached clients against real HTTP

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use favorites_storefront::cache::{CachePolicy, CachedQueryClient};
use favorites_storefront::config::{
    CacheConfig, FavoritesServiceConfig, ShopifyStorefrontConfig, StorefrontConfig,
};
use favorites_storefront::middleware::session::SESSION_COOKIE_NAME;
use favorites_storefront::middleware::set_shopify_customer_token;
use favorites_storefront::services::favorites::FAVORITES_NAMESPACE;
use favorites_storefront::services::{FavoritesClient, FavoritesOrchestrator, FavoritesRestSource};
use favorites_storefront::shopify::{
    CatalogClient, CustomerAccessToken, CustomerClient, STOREFRONT_NAMESPACE, StorefrontClient,
};
use favorites_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower_sessions::{MemoryStore, Session};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token the mocked Customer Account API accepts.
pub const ACCESS_TOKEN: &str = "shcat_integration_token";

/// Path of the mocked Storefront GraphQL endpoint.
pub const STOREFRONT_PATH: &str = "/api/2026-01/graphql.json";

/// Path of the mocked Customer Account GraphQL endpoint.
pub const CUSTOMER_PATH: &str = "/customer/api/2026-01/graphql";

/// A running storefront wired to mock upstreams.
pub struct TestContext {
    /// Mock favorites REST service.
    pub favorites: MockServer,
    /// Mock Shopify APIs (Storefront and Customer Account).
    pub shopify: MockServer,
    /// Application state behind the running server.
    pub state: AppState,
    /// Session store shared with the running server.
    pub sessions: MemoryStore,
    /// Address the storefront listens on.
    pub addr: SocketAddr,
    /// Client for requests to the storefront.
    pub client: reqwest::Client,
}

impl TestContext {
    /// Start mock upstreams and the storefront with the given cache policies.
    pub async fn with_policies(favorites_policy: CachePolicy, catalog_policy: CachePolicy) -> Self {
        let favorites = MockServer::start().await;
        let shopify = MockServer::start().await;
        let http = reqwest::Client::new();

        let config = test_config(&favorites.uri(), favorites_policy, catalog_policy);

        let favorites_client = FavoritesClient::new(
            CachedQueryClient::new(
                FAVORITES_NAMESPACE,
                FavoritesRestSource::new(http.clone(), favorites.uri()),
                config.cache.max_capacity,
            ),
            favorites_policy,
        );
        let catalog = CatalogClient::new(
            CachedQueryClient::new(
                STOREFRONT_NAMESPACE,
                StorefrontClient::with_endpoint(
                    http.clone(),
                    format!("{}{STOREFRONT_PATH}", shopify.uri()),
                    "shpat_integration_private_token",
                ),
                config.cache.max_capacity,
            ),
            catalog_policy,
        );
        let customers =
            CustomerClient::with_endpoint(http, format!("{}{CUSTOMER_PATH}", shopify.uri()));

        let state = AppState::from_parts(
            config,
            FavoritesOrchestrator::new(favorites_client, catalog),
            customers,
        );
        let sessions = MemoryStore::default();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = favorites_storefront::app(state.clone(), sessions.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            favorites,
            shopify,
            state,
            sessions,
            addr,
            client: reqwest::Client::new(),
        }
    }

    /// Start with favorites read through the cache (long) and catalog short.
    pub async fn new() -> Self {
        Self::with_policies(CachePolicy::Long, CachePolicy::Short).await
    }

    /// URL of a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Create a signed-in session and return its cookie header value.
    pub async fn sign_in(&self) -> String {
        let session = Session::new(None, Arc::new(self.sessions.clone()), None);
        let token = CustomerAccessToken {
            access_token: ACCESS_TOKEN.to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: None,
            obtained_at: 0,
        };
        set_shopify_customer_token(&session, &token).await.unwrap();
        session.save().await.unwrap();

        let id = session.id().unwrap();
        format!("{SESSION_COOKIE_NAME}={id}")
    }

    /// Answer the Customer Account API `customer { id }` query.
    pub async fn mock_customer(&self, customer_gid: &str) {
        Mock::given(method("POST"))
            .and(path(CUSTOMER_PATH))
            .and(header("Authorization", ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "customer": { "id": customer_gid } }
            })))
            .mount(&self.shopify)
            .await;
    }

    /// Answer the Storefront `nodes(ids:)` query with `nodes`.
    pub async fn mock_catalog(&self, nodes: Value) {
        Mock::given(method("POST"))
            .and(path(STOREFRONT_PATH))
            .and(header("Shopify-Storefront-Private-Token", "shpat_integration_private_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "nodes": nodes }
            })))
            .mount(&self.shopify)
            .await;
    }

    /// Requests the mock Shopify server received at `request_path`.
    pub async fn shopify_requests(&self, request_path: &str) -> usize {
        self.shopify
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}

/// Configuration pointing at mock upstreams.
#[must_use]
pub fn test_config(
    favorites_url: &str,
    favorites_policy: CachePolicy,
    catalog_policy: CachePolicy,
) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        favorites: FavoritesServiceConfig {
            base_url: favorites_url.to_string(),
            cache_policy: favorites_policy,
        },
        shopify: ShopifyStorefrontConfig {
            store: "test-store.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("shpat_integration_private_token"),
            customer_shop_id: "12345".to_string(),
        },
        cache: CacheConfig {
            max_capacity: 100,
            catalog_policy,
        },
        http_timeout: Duration::from_secs(5),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Storefront product node JSON.
#[must_use]
pub fn product_node(id: u64, handle: &str, title: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "handle": handle,
        "title": title,
        "featuredImage": {
            "id": format!("gid://shopify/ProductImage/{id}"),
            "altText": title,
            "url": format!("https://cdn.shopify.com/{handle}.jpg"),
            "width": 800,
            "height": 800
        }
    })
}

/// Favorite record JSON as the favorites service returns it.
#[must_use]
pub fn favorite_json(id: u64, product_id: &str, customer_id: u64) -> Value {
    json!({
        "id": format!("gid://shopify/Favorite/{id}"),
        "productId": product_id,
        "customerId": customer_id
    })
}
