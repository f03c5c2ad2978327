//! Client for the favorites REST service.
//!
//! Reads go through a [`CachedQueryClient`] whose "query" is a path
//! template such as `/api/favorites/{customerId}`; the variables fill the
//! placeholders. Deletions bypass the cache and invalidate it on success.

use std::sync::Arc;

use favorites_core::{CustomerRecordId, Favorite, FavoriteRecordId};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::cache::{CacheError, CachePolicy, CachedQueryClient, FetchError, QuerySource};
use crate::shopify::truncate_body;

use super::FavoritesService;

/// Cache namespace for favorites service reads.
pub const FAVORITES_NAMESPACE: &str = "favorites";

/// Path template listing a customer's favorites.
pub const LIST_FAVORITES_PATH: &str = "/api/favorites/{customerId}";

/// Path template addressing a single favorite.
pub const FAVORITE_PATH: &str = "/api/favorites/{favoriteId}";

/// Errors from the favorites service.
#[derive(Debug, Error)]
pub enum FavoritesApiError {
    /// A direct request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A read through the query cache failed.
    #[error(transparent)]
    Query(#[from] CacheError),
}

impl FavoritesApiError {
    /// Upstream HTTP status, if the upstream answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch(err) => err.status(),
            Self::Query(err) => err.status(),
        }
    }
}

// =============================================================================
// FavoritesRestSource
// =============================================================================

/// REST backing source for the favorites cache.
#[derive(Clone)]
pub struct FavoritesRestSource {
    inner: Arc<FavoritesRestSourceInner>,
}

struct FavoritesRestSourceInner {
    client: reqwest::Client,
    base_url: String,
}

impl FavoritesRestSource {
    /// Create a source rooted at `base_url` (no trailing slash).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(FavoritesRestSourceInner {
                client,
                base_url: base_url.into(),
            }),
        }
    }

    /// The service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Issue `DELETE {base_url}{path}`. Any 2xx is success.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn delete(&self, path: &str) -> Result<(), FetchError> {
        let response = self.inner.client.delete(self.url(path)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %truncate_body(&text, 500),
                "Favorites service rejected delete"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: truncate_body(&text, 200),
            });
        }

        Ok(())
    }
}

impl QuerySource for FavoritesRestSource {
    async fn fetch(&self, query: &str, variables: &Value) -> Result<Value, FetchError> {
        let path = expand_path(query, variables)?;
        let response = self.inner.client.get(self.url(&path)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %truncate_body(&text, 500),
                "Favorites service returned non-success status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: truncate_body(&text, 200),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl std::fmt::Debug for FavoritesRestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesRestSource")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Fill `{name}` placeholders in `template` from `variables`.
///
/// Values are percent-encoded path segments. Strings are used as-is, numbers
/// by their decimal form; anything else, or a missing name, is an error.
pub(crate) fn expand_path(template: &str, variables: &Value) -> Result<String, FetchError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        path.push_str(literal);

        let close = tail
            .find('}')
            .ok_or_else(|| FetchError::InvalidRequest(format!("unclosed placeholder in {template}")))?;
        let name = tail.get(1..close).unwrap_or_default();

        let segment = match variables.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(FetchError::InvalidRequest(format!(
                    "missing path variable `{name}`"
                )));
            }
        };
        path.push_str(&urlencoding::encode(&segment));
        rest = tail.get(close + 1..).unwrap_or_default();
    }

    path.push_str(rest);
    Ok(path)
}

// =============================================================================
// FavoritesClient
// =============================================================================

/// Favorites service operations used by the account pages.
#[derive(Clone, Debug)]
pub struct FavoritesClient {
    query: CachedQueryClient<FavoritesRestSource>,
    policy: CachePolicy,
}

impl FavoritesClient {
    /// Create a favorites client over a cached REST query client.
    #[must_use]
    pub const fn new(query: CachedQueryClient<FavoritesRestSource>, policy: CachePolicy) -> Self {
        Self { query, policy }
    }

    /// The underlying cached query client.
    #[must_use]
    pub const fn query_client(&self) -> &CachedQueryClient<FavoritesRestSource> {
        &self.query
    }

    /// List a customer's favorites in service order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a favorites array.
    #[instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn list_favorites(
        &self,
        customer_id: &CustomerRecordId,
    ) -> Result<Vec<Favorite>, FavoritesApiError> {
        let favorites: Vec<Favorite> = self
            .query
            .query(
                LIST_FAVORITES_PATH,
                &json!({ "customerId": customer_id.as_str() }),
                self.policy,
            )
            .await?;

        debug!(count = favorites.len(), "Fetched favorites");
        Ok(favorites)
    }

    /// Delete one favorite and drop cached favorites reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip_all, fields(favorite_id = %favorite_id))]
    pub async fn delete_favorite(&self, favorite_id: &FavoriteRecordId) -> Result<(), FavoritesApiError> {
        let path = expand_path(FAVORITE_PATH, &json!({ "favoriteId": favorite_id.as_str() }))?;
        self.query.source().delete(&path).await?;

        self.query.invalidate_all();
        debug!("Deleted favorite");
        Ok(())
    }
}

impl FavoritesService for FavoritesClient {
    async fn list(&self, customer_id: &CustomerRecordId) -> Result<Vec<Favorite>, FavoritesApiError> {
        self.list_favorites(customer_id).await
    }

    async fn delete(&self, favorite_id: &FavoriteRecordId) -> Result<(), FavoritesApiError> {
        self.delete_favorite(favorite_id).await
    }
}
