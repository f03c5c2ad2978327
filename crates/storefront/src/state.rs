//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::CachedQueryClient;
use crate::config::StorefrontConfig;
use crate::services::favorites::FAVORITES_NAMESPACE;
use crate::services::{FavoritesClient, FavoritesOrchestrator, FavoritesRestSource};
use crate::shopify::{CatalogClient, CustomerClient, STOREFRONT_NAMESPACE, StorefrontClient};

/// Orchestrator wired to the production services.
pub type Favorites = FavoritesOrchestrator<FavoritesClient, CatalogClient>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the query caches and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    favorites: Favorites,
    customers: CustomerClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let favorites = FavoritesClient::new(
            CachedQueryClient::new(
                FAVORITES_NAMESPACE,
                FavoritesRestSource::new(client.clone(), config.favorites.base_url.clone()),
                config.cache.max_capacity,
            ),
            config.favorites.cache_policy,
        );
        let catalog = CatalogClient::new(
            CachedQueryClient::new(
                STOREFRONT_NAMESPACE,
                StorefrontClient::new(client.clone(), &config.shopify),
                config.cache.max_capacity,
            ),
            config.cache.catalog_policy,
        );
        let customers = CustomerClient::new(client, &config.shopify);

        Ok(Self::from_parts(
            config,
            FavoritesOrchestrator::new(favorites, catalog),
            customers,
        ))
    }

    /// Assemble state from already constructed services.
    #[must_use]
    pub fn from_parts(config: StorefrontConfig, favorites: Favorites, customers: CustomerClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                favorites,
                customers,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the favorites orchestrator.
    #[must_use]
    pub fn favorites(&self) -> &Favorites {
        &self.inner.favorites
    }

    /// Get a reference to the Customer Account API client.
    #[must_use]
    pub fn customers(&self) -> &CustomerClient {
        &self.inner.customers
    }

    /// Wait for background cache revalidations to finish.
    pub async fn flush(&self) {
        self.inner.favorites.favorites().query_client().flush().await;
        self.inner.favorites.catalog().query_client().flush().await;
    }
}
