//! Per-request CSP nonces and the storefront's Content-Security-Policy.
//!
//! Pages that need an inline script (the checkout billing toggle) tag it with
//! `nonce="{{ page.nonce }}"`; the policy built here allows exactly that nonce.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Random 128-bit nonce, base64 encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Build the policy, allowing inline scripts only when they carry `nonce`.
///
/// Images may come from any HTTPS host since product photos are hot-linked.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.value().is_empty() => format!("'self' 'nonce-{}'", nonce.value()),
        _ => "'self'".to_string(),
    };

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'; \
         upgrade-insecure-requests"
    )
}

/// Store a fresh [`CspNonce`] in the request extensions.
///
/// Must wrap `security_headers_middleware` so the header can include the nonce.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("No CSP nonce on request; inline scripts will be blocked");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique_and_decode_to_16_bytes() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a, b);
        assert_eq!(STANDARD.decode(a.value()).map(|v| v.len()).ok(), Some(16));
    }

    #[test]
    fn test_policy_includes_nonce_only_when_present() {
        let nonce = CspNonce("abc123==".to_string());
        let with = content_security_policy(Some(&nonce));
        assert!(with.contains("script-src 'self' 'nonce-abc123=='; "));

        let without = content_security_policy(None);
        assert!(without.contains("script-src 'self'; "));
        assert!(!without.contains("nonce-"));

        let empty = content_security_policy(Some(&CspNonce(String::new())));
        assert_eq!(empty, without);
    }
}
