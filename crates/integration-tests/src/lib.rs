//! Integration test support for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Nothing here needs a running database: checkout runs against
//! [`MemoryCheckoutStore`], and router tests use a lazy pool that is only
//! touched by handlers the tests never reach.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use bazaar_core::{CartItemId, OrderId, ProductId, UserId, VariantId};
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::db::RepositoryError;
use bazaar_storefront::middleware;
use bazaar_storefront::models::{CartLine, OrderDraft, OrderReceipt};
use bazaar_storefront::routes;
use bazaar_storefront::services::{CheckoutError, CheckoutStore};
use bazaar_storefront::state::AppState;

/// An order committed to [`MemoryCheckoutStore`].
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub draft: OrderDraft,
}

/// In-memory [`CheckoutStore`] with hooks for forcing failures.
#[derive(Default)]
pub struct MemoryCheckoutStore {
    carts: Mutex<HashMap<UserId, Vec<CartLine>>>,
    orders: Mutex<Vec<StoredOrder>>,
    taken_numbers: Mutex<HashSet<String>>,
    added_after_load: Mutex<Vec<(UserId, CartLine)>>,
    forced_collisions: AtomicU32,
    fail_commits: AtomicU32,
    commit_attempts: AtomicU32,
    next_order_id: AtomicI32,
}

impl MemoryCheckoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cart(&self, user_id: UserId, lines: Vec<CartLine>) {
        lock(&self.carts).insert(user_id, lines);
    }

    #[must_use]
    pub fn cart(&self, user_id: UserId) -> Vec<CartLine> {
        lock(&self.carts).get(&user_id).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<StoredOrder> {
        lock(&self.orders).clone()
    }

    /// Add `line` to the user's cart right after the next snapshot is taken,
    /// as a second browser tab would.
    pub fn add_after_next_load(&self, user_id: UserId, line: CartLine) {
        lock(&self.added_after_load).push((user_id, line));
    }

    /// Report the next `n` commits as order number collisions.
    pub fn collide_next(&self, n: u32) {
        self.forced_collisions.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` commits with a database error.
    pub fn fail_next(&self, n: u32) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    #[must_use]
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl CheckoutStore for MemoryCheckoutStore {
    async fn load_cart(&self, user_id: UserId) -> Result<Vec<CartLine>, CheckoutError> {
        let snapshot = self.cart(user_id);

        let pending = std::mem::take(&mut *lock(&self.added_after_load));
        let mut carts = lock(&self.carts);
        for (owner, line) in pending {
            carts.entry(owner).or_default().push(line);
        }

        Ok(snapshot)
    }

    async fn commit_order(
        &self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> Result<OrderReceipt, CheckoutError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.fail_commits) {
            return Err(CheckoutError::Repository(RepositoryError::Database(
                sqlx::Error::PoolTimedOut,
            )));
        }

        if take_one(&self.forced_collisions)
            || !lock(&self.taken_numbers).insert(draft.order_number.as_str().to_owned())
        {
            return Err(CheckoutError::DuplicateOrderNumber);
        }

        let id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst) + 1);
        lock(&self.orders).push(StoredOrder {
            id,
            user_id,
            draft: draft.clone(),
        });
        if let Some(cart) = lock(&self.carts).get_mut(&user_id) {
            cart.retain(|line| !draft.cart_item_ids.contains(&line.id));
        }

        Ok(OrderReceipt {
            order_id: id,
            order_number: draft.order_number.clone(),
        })
    }
}

/// A cart line priced in cents, with an optional variant price override.
#[must_use]
pub fn cart_line(id: i32, name: &str, cents: i64, variant_cents: Option<i64>, quantity: i32) -> CartLine {
    CartLine {
        id: CartItemId::new(id),
        product_id: ProductId::new(id),
        variant_id: variant_cents.map(|_| VariantId::new(id * 100)),
        product_name: name.to_string(),
        variant_name: variant_cents.map(|_| "Large".to_string()),
        product_price: Decimal::new(cents, 2),
        variant_price: variant_cents.map(|c| Decimal::new(c, 2)),
        quantity,
        image_url: None,
    }
}

/// Configuration for router tests. Never used to connect anywhere.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://bazaar@127.0.0.1:1/bazaar_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("k8Vq2mZr7Lx4Wn9Tb3Hc6Pj1Fd5Gs0Ya"),
        catalog_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The storefront router with in-memory sessions and a lazy pool.
///
/// # Panics
///
/// Panics if the lazy pool URL fails to parse.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_app() -> Router {
    let config = test_config();
    let pool = PgPool::connect_lazy("postgres://bazaar@127.0.0.1:1/bazaar_test")
        .expect("lazy pool URL should parse");
    let state = AppState::new(config, pool);

    routes::routes()
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(SessionManagerLayer::new(MemoryStore::default()))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .with_state(state)
}
