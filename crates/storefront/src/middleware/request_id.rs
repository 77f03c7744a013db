//! Request IDs for log and Sentry correlation.
//!
//! An upstream `x-request-id` is reused when it looks sane; anything else
//! (missing, too long, odd characters) is replaced with a UUID v4 so client
//! input never lands unfiltered in logs or response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

fn accept_upstream(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Assign a request ID, record it on the `http_request` span and the Sentry
/// scope, and echo it back in the response headers.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| accept_upstream(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_ids() {
        assert!(accept_upstream("3f2a9c1e-77b0-4b8e-a8a3-0d6c2f1b9e44"));
        assert!(accept_upstream("cf-ray.8a1b2c3d_IAD"));
        assert!(!accept_upstream(""));
        assert!(!accept_upstream("id with spaces"));
        assert!(!accept_upstream("evil\r\nset-cookie"));
        assert!(!accept_upstream(&"a".repeat(MAX_REQUEST_ID_LEN + 1)));
    }
}
