//! Router behaviour that needs no database: auth gating, 404s, headers and
//! rate limiting.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use bazaar_integration_tests::test_app;

const CLIENT_IP: &str = "203.0.113.7";

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-real-ip", CLIENT_IP)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header("x-real-ip", CLIENT_IP)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_account_pages_redirect_anonymous_visitors_to_login() {
    for uri in ["/checkout", "/orders", "/orders/1", "/wishlist"] {
        let response = test_app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&response), "/auth", "GET {uri}");
    }
}

#[tokio::test]
async fn test_anonymous_order_placement_redirects_to_login() {
    let response = test_app()
        .oneshot(post_form("/checkout", "shipping_full_name=Ada"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
}

#[tokio::test]
async fn test_public_pages_render_for_anonymous_visitors() {
    for uri in ["/auth", "/cart", "/cart/count"] {
        let response = test_app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn test_unknown_path_is_a_404_page() {
    let response = test_app().oneshot(get("/no-such-page")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("<html"));
}

#[tokio::test]
async fn test_security_headers_carry_a_per_request_nonce() {
    let first = test_app().oneshot(get("/auth")).await.unwrap();
    let second = test_app().oneshot(get("/auth")).await.unwrap();

    let csp = |r: &Response| {
        r.headers()
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned()
    };

    assert!(csp(&first).contains("'nonce-"));
    assert_ne!(csp(&first), csp(&second));
    assert_eq!(first.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_replaced() {
    let request = Request::get("/auth")
        .header("x-request-id", "edge-7f3a91")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "edge-7f3a91");

    let request = Request::get("/auth")
        .header("x-request-id", "not ok")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    let assigned = response.headers().get("x-request-id").unwrap();
    assert_ne!(assigned, "not ok");
    assert_eq!(assigned.len(), 36);
}

#[tokio::test]
async fn test_login_attempts_are_rate_limited_per_client() {
    let app = test_app();

    // Malformed emails fail before any database lookup.
    for attempt in 1..=5 {
        let response = app
            .clone()
            .oneshot(post_form("/auth/login", "email=not-an-email&password=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "attempt {attempt}");
    }

    let response = app
        .clone()
        .oneshot(post_form("/auth/login", "email=not-an-email&password=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // The login page itself is not limited.
    let response = app.oneshot(get("/auth")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
