//! Favorites route handlers.
//!
//! These routes require a signed-in Shopify customer.

use axum::{Form, Json, extract::State};
use favorites_core::MergedFavoriteView;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireShopifyCustomer;
use crate::services::ShopifyAccountSession;
use crate::state::AppState;

/// Form body for removing a favorite.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFavoriteForm {
    /// Favorite gid, e.g. `gid://shopify/Favorite/9`.
    pub favorite_id: String,
}

fn account_session(state: &AppState, customer: RequireShopifyCustomer) -> ShopifyAccountSession {
    ShopifyAccountSession::new(customer.session, customer.token, state.customers().clone())
}

/// List the customer's favorites.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    customer: RequireShopifyCustomer,
) -> Result<Json<MergedFavoriteView>> {
    let session = account_session(&state, customer);
    let view = state.favorites().list(&session).await?;
    Ok(Json(view))
}

/// Remove one favorite.
#[instrument(skip_all)]
pub async fn remove(
    State(state): State<AppState>,
    customer: RequireShopifyCustomer,
    Form(form): Form<RemoveFavoriteForm>,
) -> Result<Json<Value>> {
    let session = account_session(&state, customer);
    state
        .favorites()
        .remove(&session, &form.favorite_id)
        .await?;

    add_breadcrumb(
        "favorites",
        "Removed favorite",
        Some(&[("favorite_id", form.favorite_id.as_str())]),
    );
    Ok(Json(json!({})))
}
