//! Business logic services for the favorites pages.
//!
//! # Services
//!
//! - `favorites` - REST client for the favorites service
//! - `orchestrator` - Read and delete flows over the services below
//! - `session` - Signed-in customer backed by `tower-sessions`
//!
//! The orchestrator talks to its collaborators through the traits in this
//! module so tests can substitute in-process fakes.

pub mod favorites;
pub mod orchestrator;
pub mod session;

use std::future::Future;

use favorites_core::{CatalogItem, CustomerRecordId, Favorite, FavoriteRecordId, Gid};

pub use favorites::{FavoritesApiError, FavoritesClient, FavoritesRestSource};
pub use orchestrator::{FavoritesError, FavoritesOrchestrator};
pub use session::{SessionError, ShopifyAccountSession};

/// Boxed error used where a collaborator's error type is erased.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Source of a customer's favorite records.
pub trait FavoritesService: Send + Sync {
    /// List a customer's favorites in service order.
    fn list(
        &self,
        customer_id: &CustomerRecordId,
    ) -> impl Future<Output = Result<Vec<Favorite>, FavoritesApiError>> + Send;

    /// Delete one favorite.
    fn delete(
        &self,
        favorite_id: &FavoriteRecordId,
    ) -> impl Future<Output = Result<(), FavoritesApiError>> + Send;
}

/// Batch resolution of catalog ids to display data.
pub trait CatalogService: Send + Sync {
    /// Error returned by a failed lookup.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolve `ids`; ids that match no product are omitted from the result.
    fn products_by_ids(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<CatalogItem>, Self::Error>> + Send;
}

/// The request's account session.
pub trait AccountSession: Send + Sync {
    /// Error returned by the session store or identity lookup.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The signed-in customer's gid, or `None` when signed out.
    fn customer_id(&self) -> impl Future<Output = Result<Option<Gid>, Self::Error>> + Send;

    /// Persist session state.
    fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
