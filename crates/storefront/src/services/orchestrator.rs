//! Favorites read and delete flows.
//!
//! [`FavoritesOrchestrator`] ties the signed-in customer, the favorites
//! service and the catalog together. Every external call happens at most
//! once per request and nothing is retried.

use std::collections::HashMap;

use favorites_core::{
    CatalogItem, CustomerRecordId, Favorite, FavoriteItem, FavoriteRecordId, GidError,
    MergedFavoriteView,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::cache::CacheError;

use super::favorites::FavoritesApiError;
use super::{AccountSession, BoxError, CatalogService, FavoritesService};

/// Failure of a favorites flow. All variants are terminal.
#[derive(Debug, Error)]
pub enum FavoritesError {
    /// No signed-in customer could be resolved.
    #[error("customer not found")]
    CustomerNotFound(#[source] Option<BoxError>),

    /// The favorites service could not list favorites.
    #[error("failed to fetch favorites")]
    FavoritesFetchFailed {
        /// Upstream status, if the service answered.
        status: Option<u16>,
        #[source]
        source: FavoritesApiError,
    },

    /// The catalog lookup failed.
    #[error("failed to resolve favorited products")]
    ProductResolutionFailed(#[source] BoxError),

    /// The favorite id in the request is not a favorite gid.
    #[error("invalid favorite id: {0}")]
    InvalidFavoriteId(#[source] GidError),

    /// The favorites service rejected or never received the deletion.
    #[error("failed to delete favorite")]
    DeleteFailed {
        /// Upstream status, if the service answered.
        status: Option<u16>,
        #[source]
        source: FavoritesApiError,
    },

    /// A cached query failed outside the fetch and delete steps.
    #[error("cached query failed")]
    CacheFetchFailed(#[source] CacheError),

    /// Session state could not be persisted.
    #[error("failed to commit session")]
    SessionCommitFailed(#[source] BoxError),
}

impl FavoritesError {
    /// Upstream HTTP status carried by the error, if any.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::FavoritesFetchFailed { status, .. } | Self::DeleteFailed { status, .. } => *status,
            Self::CacheFetchFailed(err) => err.status(),
            _ => None,
        }
    }

    /// Whether the failure was caused by the client's request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::CustomerNotFound(_) | Self::InvalidFavoriteId(_))
    }
}

/// Favorites read and delete flows over injected collaborators.
#[derive(Clone, Debug)]
pub struct FavoritesOrchestrator<F, C> {
    favorites: F,
    catalog: C,
}

impl<F, C> FavoritesOrchestrator<F, C>
where
    F: FavoritesService,
    C: CatalogService,
{
    /// Create an orchestrator.
    #[must_use]
    pub const fn new(favorites: F, catalog: C) -> Self {
        Self { favorites, catalog }
    }

    /// The favorites service.
    #[must_use]
    pub const fn favorites(&self) -> &F {
        &self.favorites
    }

    /// The catalog service.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// List the signed-in customer's favorites resolved against the catalog.
    ///
    /// The session is committed once the view is built, including when the
    /// customer has no favorites.
    ///
    /// # Errors
    ///
    /// See [`FavoritesError`]; nothing is committed on failure.
    #[instrument(skip_all)]
    pub async fn list<S: AccountSession>(
        &self,
        session: &S,
    ) -> Result<MergedFavoriteView, FavoritesError> {
        let customer_id = resolve_customer(session).await?;

        let favorites = self.favorites.list(&customer_id).await.map_err(|err| {
            tracing::warn!(error = %err, "Favorites service request failed");
            match err {
                // The query itself was unusable; nothing was fetched.
                FavoritesApiError::Query(
                    cache @ (CacheError::InvalidQuery | CacheError::Variables(_)),
                ) => FavoritesError::CacheFetchFailed(cache),
                err => FavoritesError::FavoritesFetchFailed {
                    status: err.status(),
                    source: err,
                },
            }
        })?;

        let view = if favorites.is_empty() {
            debug!("Customer has no favorites");
            MergedFavoriteView::default()
        } else {
            let ids: Vec<String> = favorites.iter().map(Favorite::catalog_id).collect();
            let items = self
                .catalog
                .products_by_ids(&ids)
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, "Catalog lookup failed");
                    FavoritesError::ProductResolutionFailed(Box::new(err))
                })?;
            merge(&favorites, items)
        };

        commit(session).await?;
        Ok(view)
    }

    /// Delete one favorite by its gid.
    ///
    /// The id is validated before any network call. On success the session
    /// is committed.
    ///
    /// # Errors
    ///
    /// See [`FavoritesError`]; the session is left untouched on failure.
    #[instrument(skip(self, session))]
    pub async fn remove<S: AccountSession>(
        &self,
        session: &S,
        favorite_id: &str,
    ) -> Result<(), FavoritesError> {
        let record_id =
            FavoriteRecordId::parse_gid(favorite_id).map_err(FavoritesError::InvalidFavoriteId)?;

        self.favorites.delete(&record_id).await.map_err(|err| {
            tracing::warn!(error = %err, "Favorite deletion failed");
            FavoritesError::DeleteFailed {
                status: err.status(),
                source: err,
            }
        })?;

        commit(session).await
    }
}

async fn resolve_customer<S: AccountSession>(
    session: &S,
) -> Result<CustomerRecordId, FavoritesError> {
    let gid = session
        .customer_id()
        .await
        .map_err(|err| FavoritesError::CustomerNotFound(Some(Box::new(err))))?
        .ok_or(FavoritesError::CustomerNotFound(None))?;

    CustomerRecordId::from_gid(&gid).map_err(|err| FavoritesError::CustomerNotFound(Some(Box::new(err))))
}

async fn commit<S: AccountSession>(session: &S) -> Result<(), FavoritesError> {
    session.commit().await.map_err(|err| {
        tracing::error!(error = %err, "Failed to commit session");
        FavoritesError::SessionCommitFailed(Box::new(err))
    })
}

/// Pair favorites with catalog items, keeping favorites order.
///
/// Favorites whose product did not resolve are dropped.
#[must_use]
pub fn merge(favorites: &[Favorite], items: Vec<CatalogItem>) -> MergedFavoriteView {
    let by_id: HashMap<String, CatalogItem> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();

    let favorites = favorites
        .iter()
        .filter_map(|favorite| {
            let catalog_id = favorite.catalog_id();
            // A product favorited twice resolves for both entries.
            let item = by_id.get(&catalog_id).cloned();
            if item.is_none() {
                debug!(favorite_id = %favorite.id, catalog_id, "Dropping unresolved favorite");
            }
            item.map(|item| FavoriteItem {
                favorite_id: favorite.id.clone(),
                item,
            })
        })
        .collect();

    MergedFavoriteView { favorites }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use favorites_core::Gid;

    use super::*;
    use crate::cache::FetchError;

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct FakeError(&'static str);

    #[derive(Clone, Default)]
    struct FakeFavorites {
        favorites: Vec<Favorite>,
        fail_status: Option<u16>,
        lists: Arc<AtomicUsize>,
        deleted: Arc<Mutex<Vec<String>>>,
    }

    impl FavoritesService for FakeFavorites {
        async fn list(&self, customer_id: &CustomerRecordId) -> Result<Vec<Favorite>, FavoritesApiError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_status {
                return Err(FavoritesApiError::Query(CacheError::FetchFailed(Arc::new(
                    FetchError::Status {
                        status,
                        reason: "error".to_string(),
                    },
                ))));
            }
            assert_eq!(customer_id.as_str(), "7");
            Ok(self.favorites.clone())
        }

        async fn delete(&self, favorite_id: &FavoriteRecordId) -> Result<(), FavoritesApiError> {
            if let Some(status) = self.fail_status {
                return Err(FavoritesApiError::Fetch(FetchError::Status {
                    status,
                    reason: "error".to_string(),
                }));
            }
            self.deleted.lock().unwrap().push(favorite_id.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeCatalog {
        items: Vec<CatalogItem>,
        fail: bool,
        calls: Arc<AtomicUsize>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl CatalogService for FakeCatalog {
        type Error = FakeError;

        async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogItem>, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().extend_from_slice(ids);
            if self.fail {
                return Err(FakeError("catalog down"));
            }
            Ok(self.items.clone())
        }
    }

    #[derive(Default)]
    struct FakeSession {
        customer: Option<&'static str>,
        fail_lookup: bool,
        fail_commit: bool,
        commits: AtomicUsize,
    }

    impl FakeSession {
        fn signed_in() -> Self {
            Self {
                customer: Some("gid://shopify/Customer/7"),
                ..Self::default()
            }
        }

        fn commits(&self) -> usize {
            self.commits.load(Ordering::SeqCst)
        }
    }

    impl AccountSession for FakeSession {
        type Error = FakeError;

        async fn customer_id(&self) -> Result<Option<Gid>, Self::Error> {
            if self.fail_lookup {
                return Err(FakeError("lookup failed"));
            }
            Ok(self.customer.map(|gid| Gid::parse(gid).unwrap()))
        }

        async fn commit(&self) -> Result<(), Self::Error> {
            if self.fail_commit {
                return Err(FakeError("store unavailable"));
            }
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn favorite(id: &str, product_id: &str) -> Favorite {
        Favorite {
            id: format!("gid://shopify/Favorite/{id}"),
            product_id: product_id.to_string(),
            customer_id: "7".to_string(),
        }
    }

    fn product(id: &str, handle: &str) -> CatalogItem {
        CatalogItem {
            id: format!("gid://shopify/Product/{id}"),
            handle: handle.to_string(),
            title: handle.to_uppercase(),
            featured_image: None,
        }
    }

    #[tokio::test]
    async fn test_list_resolves_single_favorite() {
        let favorites = FakeFavorites {
            favorites: vec![favorite("9", "42")],
            ..FakeFavorites::default()
        };
        let catalog = FakeCatalog {
            items: vec![product("42", "cool-shirt")],
            ..FakeCatalog::default()
        };
        let orchestrator = FavoritesOrchestrator::new(favorites, catalog.clone());
        let session = FakeSession::signed_in();

        let view = orchestrator.list(&session).await.unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(view.favorites[0].favorite_id, "gid://shopify/Favorite/9");
        assert_eq!(view.favorites[0].item.handle, "cool-shirt");
        assert_eq!(
            *catalog.requested.lock().unwrap(),
            vec!["gid://shopify/Product/42".to_string()]
        );
        assert_eq!(session.commits(), 1);
    }

    #[tokio::test]
    async fn test_list_empty_skips_catalog_and_commits() {
        let catalog = FakeCatalog::default();
        let orchestrator = FavoritesOrchestrator::new(FakeFavorites::default(), catalog.clone());
        let session = FakeSession::signed_in();

        let view = orchestrator.list(&session).await.unwrap();

        assert!(view.is_empty());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.commits(), 1);
    }

    #[tokio::test]
    async fn test_list_catalog_failure() {
        let favorites = FakeFavorites {
            favorites: vec![favorite("9", "42")],
            ..FakeFavorites::default()
        };
        let catalog = FakeCatalog {
            fail: true,
            ..FakeCatalog::default()
        };
        let orchestrator = FavoritesOrchestrator::new(favorites, catalog);
        let session = FakeSession::signed_in();

        let err = orchestrator.list(&session).await.unwrap_err();

        assert!(matches!(err, FavoritesError::ProductResolutionFailed(_)));
        assert_eq!(session.commits(), 0);
    }

    #[tokio::test]
    async fn test_list_drops_unresolved_in_order() {
        let favorites = FakeFavorites {
            favorites: vec![favorite("1", "10"), favorite("2", "20"), favorite("3", "30")],
            ..FakeFavorites::default()
        };
        let catalog = FakeCatalog {
            // Catalog order differs from favorites order.
            items: vec![product("30", "c"), product("10", "a")],
            ..FakeCatalog::default()
        };
        let orchestrator = FavoritesOrchestrator::new(favorites, catalog);

        let view = orchestrator.list(&FakeSession::signed_in()).await.unwrap();

        let handles: Vec<&str> = view.items().map(|item| item.handle.as_str()).collect();
        assert_eq!(handles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_list_fetch_failure_carries_status() {
        let favorites = FakeFavorites {
            fail_status: Some(503),
            ..FakeFavorites::default()
        };
        let catalog = FakeCatalog::default();
        let orchestrator = FavoritesOrchestrator::new(favorites, catalog.clone());
        let session = FakeSession::signed_in();

        let err = orchestrator.list(&session).await.unwrap_err();

        assert!(matches!(
            err,
            FavoritesError::FavoritesFetchFailed { status: Some(503), .. }
        ));
        assert_eq!(err.upstream_status(), Some(503));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.commits(), 0);
    }

    #[tokio::test]
    async fn test_list_without_customer() {
        let favorites = FakeFavorites::default();
        let orchestrator = FavoritesOrchestrator::new(favorites.clone(), FakeCatalog::default());

        let err = orchestrator.list(&FakeSession::default()).await.unwrap_err();

        assert!(matches!(err, FavoritesError::CustomerNotFound(None)));
        assert!(err.is_client_error());
        assert_eq!(favorites.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_customer_lookup_error() {
        let orchestrator =
            FavoritesOrchestrator::new(FakeFavorites::default(), FakeCatalog::default());
        let session = FakeSession {
            fail_lookup: true,
            ..FakeSession::default()
        };

        let err = orchestrator.list(&session).await.unwrap_err();

        assert!(matches!(err, FavoritesError::CustomerNotFound(Some(_))));
    }

    #[tokio::test]
    async fn test_list_non_customer_gid() {
        let orchestrator =
            FavoritesOrchestrator::new(FakeFavorites::default(), FakeCatalog::default());
        let session = FakeSession {
            customer: Some("gid://shopify/Product/7"),
            ..FakeSession::default()
        };

        let err = orchestrator.list(&session).await.unwrap_err();

        assert!(matches!(err, FavoritesError::CustomerNotFound(Some(_))));
    }

    #[tokio::test]
    async fn test_list_commit_failure() {
        let orchestrator =
            FavoritesOrchestrator::new(FakeFavorites::default(), FakeCatalog::default());
        let session = FakeSession {
            fail_commit: true,
            ..FakeSession::signed_in()
        };

        let err = orchestrator.list(&session).await.unwrap_err();

        assert!(matches!(err, FavoritesError::SessionCommitFailed(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_remove_forwards_record_id() {
        let favorites = FakeFavorites::default();
        let orchestrator = FavoritesOrchestrator::new(favorites.clone(), FakeCatalog::default());
        let session = FakeSession::default();

        orchestrator
            .remove(&session, "gid://shopify/Favorite/9")
            .await
            .unwrap();

        assert_eq!(*favorites.deleted.lock().unwrap(), vec!["9".to_string()]);
        assert_eq!(session.commits(), 1);
    }

    #[tokio::test]
    async fn test_remove_malformed_id_makes_no_call() {
        let favorites = FakeFavorites::default();
        let orchestrator = FavoritesOrchestrator::new(favorites.clone(), FakeCatalog::default());
        let session = FakeSession::default();

        for id in ["", "9", "gid://shopify/Favorite/", "gid://shopify/Product/9"] {
            let err = orchestrator.remove(&session, id).await.unwrap_err();
            assert!(matches!(err, FavoritesError::InvalidFavoriteId(_)), "{id}");
        }

        assert!(favorites.deleted.lock().unwrap().is_empty());
        assert_eq!(session.commits(), 0);
    }

    #[tokio::test]
    async fn test_remove_upstream_failure_leaves_session() {
        let favorites = FakeFavorites {
            fail_status: Some(404),
            ..FakeFavorites::default()
        };
        let orchestrator = FavoritesOrchestrator::new(favorites, FakeCatalog::default());
        let session = FakeSession::default();

        let err = orchestrator
            .remove(&session, "gid://shopify/Favorite/9")
            .await
            .unwrap_err();

        assert!(matches!(err, FavoritesError::DeleteFailed { status: Some(404), .. }));
        assert_eq!(session.commits(), 0);
    }

    #[test]
    fn test_merge_duplicate_product() {
        let favorites = vec![favorite("1", "42"), favorite("2", "42")];
        let view = merge(&favorites, vec![product("42", "cool-shirt")]);

        assert_eq!(view.len(), 2);
        assert_eq!(view.favorites[1].favorite_id, "gid://shopify/Favorite/2");
    }

    #[test]
    fn test_merge_accepts_gid_product_ids() {
        let favorites = vec![favorite("1", "gid://shopify/Product/42")];
        let view = merge(&favorites, vec![product("42", "cool-shirt")]);

        assert_eq!(view.len(), 1);
    }
}
