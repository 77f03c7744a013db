//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page (featured products)
//! GET  /health                     - Health check
//!
//! # Products
//! GET  /products                   - Product listing
//! GET  /products/{id}              - Product detail
//! POST /products/{id}/cart         - Add to cart
//! POST /products/{id}/wishlist     - Add to wishlist
//!
//! # Cart
//! GET  /cart                       - Cart page
//! POST /cart/update                - Set line quantity (0 removes)
//! POST /cart/remove                - Remove line
//! GET  /cart/count                 - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                   - Checkout form
//! POST /checkout                   - Place order
//!
//! # Orders (requires auth)
//! GET  /orders                     - Order history
//! GET  /orders/{id}                - Order detail
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                   - Wishlist
//! POST /wishlist/{id}/remove       - Remove entry
//! POST /wishlist/{id}/cart         - Move product into the cart
//!
//! # Auth
//! GET  /auth                       - Sign in / sign up page
//! POST /auth/login                 - Login action
//! POST /auth/register              - Register action
//! POST /auth/logout                - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::db::CartRepository;
use crate::middleware::{
    CspNonce, OptionalAuth, auth_rate_limiter, checkout_rate_limiter, take_flash,
};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// Per-request data every full page needs for its header and notices.
///
/// Extracting this consumes the pending flash notice, so only handlers that
/// render a page should take it.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub cart_count: i64,
    pub nonce: String,
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;

        let flash = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => None,
        };

        let cart_count = match &user {
            Some(user) => CartRepository::new(state.pool())
                .item_count(user.id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count cart items");
                    0
                }),
            None => 0,
        };

        Ok(Self {
            user,
            flash,
            cart_count,
            nonce,
        })
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/cart", post(products::add_to_cart))
        .route("/{id}/wishlist", post(products::add_to_wishlist))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let place_order = post(checkout::place_order).route_layer(checkout_rate_limiter());

    Router::new().route("/", get(checkout::show).merge(place_order))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/{id}/remove", post(wishlist::remove))
        .route("/{id}/cart", post(wishlist::add_to_cart))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/", get(auth::index))
        .route("/logout", post(auth::logout))
        .merge(credentials)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/auth", auth_routes())
        .fallback(home::not_found)
}
