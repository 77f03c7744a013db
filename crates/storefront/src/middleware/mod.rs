//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Security headers (CSP, HSTS, etc.)
//! 7. Rate limiting on auth and checkout posts (governor)

pub mod auth;
pub mod csp;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use flash::{set_flash, take_flash};
pub use rate_limit::{auth_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
