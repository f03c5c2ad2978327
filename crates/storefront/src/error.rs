//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::FavoritesError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A favorites flow failed.
    #[error("Favorites error: {0}")]
    Favorites(#[from] FavoritesError),
}

impl AppError {
    /// HTTP status returned to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        let Self::Favorites(err) = self;
        match err {
            FavoritesError::CustomerNotFound(_) => StatusCode::UNAUTHORIZED,
            FavoritesError::InvalidFavoriteId(_) => StatusCode::BAD_REQUEST,
            FavoritesError::FavoritesFetchFailed { .. }
            | FavoritesError::ProductResolutionFailed(_)
            | FavoritesError::DeleteFailed { .. }
            | FavoritesError::CacheFetchFailed(_) => StatusCode::BAD_GATEWAY,
            FavoritesError::SessionCommitFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    const fn public_message(&self) -> &'static str {
        let Self::Favorites(err) = self;
        match err {
            FavoritesError::CustomerNotFound(_) => "Please sign in",
            FavoritesError::InvalidFavoriteId(_) => "Invalid favorite id",
            FavoritesError::SessionCommitFailed(_) => "Internal server error",
            _ => "External service error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        (status, self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("favorites", "Removed favorite", Some(&[("favorite_id", "9")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
