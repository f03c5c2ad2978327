//! Shopify Customer Account API client.
//!
//! The OAuth login flow that issues [`CustomerAccessToken`]s lives outside
//! this service. Here the token stored in the session is only used to ask
//! the Customer Account API who the signed-in customer is.

mod types;

pub use types::*;

use std::sync::Arc;

use favorites_core::Gid;
use graphql_client::Response;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::{GraphQLError, ShopifyError, truncate_body};

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
#[derive(Clone)]
pub struct CustomerClient {
    inner: Arc<CustomerClientInner>,
}

struct CustomerClientInner {
    client: reqwest::Client,
    endpoint: String,
}

impl CustomerClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(client, config.customer_endpoint())
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CustomerClientInner {
                client,
                endpoint: endpoint.into(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL query against the Customer Account API.
    async fn query<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .header("User-Agent", "StorefrontFavorites/1.0")
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate_body(&text, 200),
            });
        }

        let gql_response: Response<T> = response.json().await?;

        if let Some(errors) = gql_response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        gql_response
            .data
            .ok_or_else(|| ShopifyError::NotFound("No data in response".to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the signed-in customer's gid.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or no customer is returned.
    #[instrument(skip_all)]
    pub async fn get_customer_id(&self, access_token: &str) -> Result<Gid, ShopifyError> {
        #[derive(Deserialize)]
        struct Data {
            customer: Option<CustomerIdentity>,
        }

        const QUERY: &str = r"
            query getCustomerId {
                customer {
                    id
                }
            }
        ";

        let data: Data = self.query(access_token, QUERY, None).await?;
        data.customer
            .map(|customer| customer.id)
            .ok_or_else(|| ShopifyError::NotFound("customer".to_string()))
    }
}

impl std::fmt::Debug for CustomerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}
