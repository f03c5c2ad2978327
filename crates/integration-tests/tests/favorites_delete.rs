//! Integration tests for `DELETE /account/favorites`.

#![allow(clippy::unwrap_used)]

use favorites_integration_tests::{TestContext, favorite_json, product_node};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn delete_favorite(ctx: &TestContext, cookie: &str, favorite_id: &str) -> reqwest::Response {
    ctx.client
        .delete(ctx.url("/account/favorites"))
        .header("Cookie", cookie)
        .form(&[("favoriteId", favorite_id)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delete_forwards_record_id() {
    let ctx = TestContext::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/favorites/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ctx.favorites)
        .await;

    let cookie = ctx.sign_in().await;
    let response = delete_favorite(&ctx, &cookie, "gid://shopify/Favorite/9").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_delete_accepts_200() {
    let ctx = TestContext::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/favorites/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&ctx.favorites)
        .await;

    let cookie = ctx.sign_in().await;
    let response = delete_favorite(&ctx, &cookie, "gid://shopify/Favorite/abc-123").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_id_is_bad_request_without_upstream_call() {
    let ctx = TestContext::new().await;
    let cookie = ctx.sign_in().await;

    for favorite_id in ["", "9", "gid://shopify/Product/9", "gid://shopify/Favorite/"] {
        let response = delete_favorite(&ctx, &cookie, favorite_id).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{favorite_id}");
    }

    assert!(ctx.favorites.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_rejection_is_bad_gateway() {
    let ctx = TestContext::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/favorites/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&ctx.favorites)
        .await;

    let cookie = ctx.sign_in().await;
    let response = delete_favorite(&ctx, &cookie, "gid://shopify/Favorite/9").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_signed_out_delete_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .client
        .delete(ctx.url("/account/favorites"))
        .form(&[("favoriteId", "gid://shopify/Favorite/9")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(ctx.favorites.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_invalidates_cached_favorites() {
    let ctx = TestContext::new().await;
    ctx.mock_customer("gid://shopify/Customer/7").await;
    ctx.mock_catalog(json!([product_node(42, "cool-shirt", "Cool Shirt")]))
        .await;

    Mock::given(method("GET"))
        .and(path("/api/favorites/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([favorite_json(9, "42", 7)])))
        .expect(2)
        .mount(&ctx.favorites)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/favorites/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&ctx.favorites)
        .await;

    let cookie = ctx.sign_in().await;
    let list = |cookie: String| {
        let request = ctx
            .client
            .get(ctx.url("/account/favorites"))
            .header("Cookie", cookie);
        async move { request.send().await.unwrap().status() }
    };

    assert_eq!(list(cookie.clone()).await, StatusCode::OK);
    // Served from the cache.
    assert_eq!(list(cookie.clone()).await, StatusCode::OK);

    let response = delete_favorite(&ctx, &cookie, "gid://shopify/Favorite/9").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cache dropped: the favorites service is asked again.
    assert_eq!(list(cookie).await, StatusCode::OK);
}
