//! Shopify Customer authentication extractors.
//!
//! The OAuth login flow stores a [`CustomerAccessToken`] in the session.
//! Handlers under `/account` require it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::session_keys;
use crate::shopify::CustomerAccessToken;

/// Extractor that requires a signed-in Shopify customer.
///
/// Yields the request session together with the stored access token.
/// Missing or expired tokens are rejected with `401 Unauthorized`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireShopifyCustomer { session, token }: RequireShopifyCustomer,
/// ) -> impl IntoResponse {
///     // Use token.access_token to make Customer Account API calls
///     format!("Customer authenticated!")
/// }
/// ```
pub struct RequireShopifyCustomer {
    /// The request session.
    pub session: Session,
    /// The customer's access token.
    pub token: CustomerAccessToken,
}

/// Error returned when Shopify Customer authentication is required but not present.
#[derive(Debug)]
pub enum ShopifyCustomerRejection {
    /// The session layer is missing or the session could not be read.
    SessionUnavailable,
    /// No usable customer token in the session.
    Unauthorized,
}

impl IntoResponse for ShopifyCustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::SessionUnavailable => {
                tracing::error!("Session unavailable for customer request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireShopifyCustomer
where
    S: Send + Sync,
{
    type Rejection = ShopifyCustomerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(ShopifyCustomerRejection::SessionUnavailable)?;

        let token: CustomerAccessToken = session
            .get(session_keys::SHOPIFY_CUSTOMER_TOKEN)
            .await
            .map_err(|_| ShopifyCustomerRejection::SessionUnavailable)?
            .ok_or(ShopifyCustomerRejection::Unauthorized)?;

        if token.is_expired() {
            tracing::debug!("Customer access token expired");
            return Err(ShopifyCustomerRejection::Unauthorized);
        }

        Ok(Self { session, token })
    }
}

/// Helper to set the Shopify customer token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_shopify_customer_token(
    session: &Session,
    token: &CustomerAccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::SHOPIFY_CUSTOMER_TOKEN, token)
        .await
}
