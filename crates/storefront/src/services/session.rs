//! Account session backed by `tower-sessions` and the Customer Account API.

use std::sync::OnceLock;

use favorites_core::Gid;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use crate::models::session_keys;
use crate::shopify::{CustomerAccessToken, CustomerClient, ShopifyError};

use super::AccountSession;

/// Errors from the session store or the customer lookup.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session store failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),

    /// The Customer Account API failed.
    #[error("customer lookup failed: {0}")]
    Customer(#[from] ShopifyError),
}

/// The signed-in Shopify customer's session.
///
/// The customer gid is looked up once per session with the stored access
/// token. A freshly looked-up gid is written to the session only by
/// [`AccountSession::commit`], so a failed request leaves the session as it was.
#[derive(Clone, Debug)]
pub struct ShopifyAccountSession {
    session: Session,
    token: CustomerAccessToken,
    customers: CustomerClient,
    resolved: OnceLock<Gid>,
}

impl ShopifyAccountSession {
    /// Wrap a request session holding `token`.
    #[must_use]
    pub const fn new(session: Session, token: CustomerAccessToken, customers: CustomerClient) -> Self {
        Self {
            session,
            token,
            customers,
            resolved: OnceLock::new(),
        }
    }
}

impl AccountSession for ShopifyAccountSession {
    type Error = SessionError;

    #[instrument(skip_all)]
    async fn customer_id(&self) -> Result<Option<Gid>, Self::Error> {
        if let Some(gid) = self
            .session
            .get::<Gid>(session_keys::SHOPIFY_CUSTOMER_ID)
            .await?
        {
            return Ok(Some(gid));
        }
        if let Some(gid) = self.resolved.get() {
            return Ok(Some(gid.clone()));
        }

        let gid = match self.customers.get_customer_id(&self.token.access_token).await {
            Ok(gid) => gid,
            Err(ShopifyError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(self.resolved.get_or_init(|| gid).clone()))
    }

    async fn commit(&self) -> Result<(), Self::Error> {
        if let Some(gid) = self.resolved.get() {
            self.session
                .insert(session_keys::SHOPIFY_CUSTOMER_ID, gid)
                .await?;
        }
        self.session.save().await?;
        Ok(())
    }
}
