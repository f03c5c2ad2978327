//! Shopify Storefront API client implementation.
//!
//! [`StorefrontClient`] posts GraphQL documents with `reqwest` and is the
//! backing [`QuerySource`] of the catalog cache. [`CatalogClient`] runs the
//! batch product lookup through that cache.

mod conversions;
pub mod queries;

use std::sync::Arc;

use favorites_core::CatalogItem;
use graphql_client::Response;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cache::{CachePolicy, CachedQueryClient, FetchError, QuerySource};
use crate::config::ShopifyStorefrontConfig;
use crate::services::CatalogService;
use crate::shopify::{GraphQLError, ShopifyError, format_graphql_errors, truncate_body};

use conversions::convert_product_node;
use queries::{PRODUCTS_BY_IDS_QUERY, ProductsByIdsData, ProductsByIdsVariables};

/// Cache namespace for Storefront API queries.
pub const STOREFRONT_NAMESPACE: &str = "shopify-storefront";

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(
            client,
            config.storefront_endpoint(),
            config.storefront_private_token.expose_secret(),
        )
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: &str,
    ) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: endpoint.into(),
                access_token: access_token.to_string(),
            }),
        }
    }

    /// Execute a GraphQL document and return its `data`.
    async fn execute(&self, query: &str, variables: &Value) -> Result<Value, FetchError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: format!("rate limited, retry after {retry_after} seconds"),
            });
        }

        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %truncate_body(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: truncate_body(&response_text, 200),
            });
        }

        let response_text = response.text().await?;
        let response: Response<Value> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate_body(&response_text, 500),
                "Failed to parse Shopify GraphQL response"
            );
            FetchError::Decode(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            let errors: Vec<GraphQLError> = errors.into_iter().map(GraphQLError::from).collect();
            return Err(FetchError::GraphQL(format_graphql_errors(&errors)));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate_body(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            FetchError::GraphQL("No data in response".to_string())
        })
    }
}

impl QuerySource for StorefrontClient {
    async fn fetch(&self, query: &str, variables: &Value) -> Result<Value, FetchError> {
        self.execute(query, variables).await
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Catalog lookups for the favorites page, cached per query and ids.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    query: CachedQueryClient<StorefrontClient>,
    policy: CachePolicy,
}

impl CatalogClient {
    /// Create a catalog client over a cached Storefront query client.
    #[must_use]
    pub const fn new(query: CachedQueryClient<StorefrontClient>, policy: CachePolicy) -> Self {
        Self { query, policy }
    }

    /// The underlying cached query client.
    #[must_use]
    pub const fn query_client(&self) -> &CachedQueryClient<StorefrontClient> {
        &self.query
    }

    /// Resolve product gids to catalog items.
    ///
    /// The result holds one item per id that resolved to a product, in the
    /// order Shopify returned them. Unknown ids are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the response is malformed.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_products_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogItem>, ShopifyError> {
        let data: ProductsByIdsData = self
            .query
            .query(
                PRODUCTS_BY_IDS_QUERY,
                &ProductsByIdsVariables { ids },
                self.policy,
            )
            .await?;

        let items: Vec<CatalogItem> = data
            .nodes
            .into_iter()
            .flatten()
            .filter_map(convert_product_node)
            .collect();

        debug!(resolved = items.len(), "Resolved catalog products");
        Ok(items)
    }
}

impl CatalogService for CatalogClient {
    type Error = ShopifyError;

    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogItem>, Self::Error> {
        self.get_products_by_ids(ids).await
    }
}
