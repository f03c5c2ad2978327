//! Types for the Shopify Customer Account API.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use favorites_core::Gid;

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Customer access token obtained via OAuth.
///
/// Issued by the login flow (outside this service) and stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect).
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl CustomerAccessToken {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let now = Utc::now().timestamp();
            let expires_at = self.obtained_at + expires_in;
            now >= (expires_at - 60)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

/// The signed-in customer, reduced to what the favorites page needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerIdentity {
    /// The customer's gid.
    pub id: Gid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: Option<i64>, obtained_at: i64) -> CustomerAccessToken {
        CustomerAccessToken {
            access_token: "shcat_token".to_string(),
            id_token: None,
            refresh_token: None,
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        assert!(!token(None, 0).is_expired());
    }

    #[test]
    fn test_fresh_token_not_expired() {
        assert!(!token(Some(3600), Utc::now().timestamp()).is_expired());
    }

    #[test]
    fn test_old_token_expired() {
        assert!(token(Some(3600), Utc::now().timestamp() - 7200).is_expired());
    }

    #[test]
    fn test_token_within_buffer_expired() {
        assert!(token(Some(30), Utc::now().timestamp()).is_expired());
    }
}
