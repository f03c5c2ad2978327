//! Session-related types.

/// Session keys for account data.
pub mod keys {
    /// Key for the Shopify customer access token, written by the login flow.
    pub const SHOPIFY_CUSTOMER_TOKEN: &str = "shopify_customer_token";

    /// Key for the signed-in customer's gid, resolved from the token.
    pub const SHOPIFY_CUSTOMER_ID: &str = "shopify_customer_id";
}
