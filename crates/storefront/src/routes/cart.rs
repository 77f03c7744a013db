//! Cart route handlers.
//!
//! Cart rows live in the database and belong to the logged-in user. Anonymous
//! visitors see a sign-in prompt instead of a cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{CartItemId, OrderTotals, PricedLine};

use super::PageContext;
use crate::db::{CartRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, set_flash};
use crate::models::catalog::{MAX_LINE_QUANTITY, is_valid_line_quantity};
use crate::models::{CartLine, Flash, cart::item_count};
use crate::state::AppState;

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart contents with totals.
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub item_count: u32,
}

impl CartView {
    fn new(lines: Vec<CartLine>) -> Self {
        let totals = OrderTotals::calculate(&lines);
        let item_count = item_count(&lines);
        Self {
            lines,
            totals,
            item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    /// `None` for anonymous visitors.
    pub cart: Option<CartView>,
    pub max_quantity: u32,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

/// Display the cart page.
#[instrument(skip(state, page))]
pub async fn show(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let cart = match &page.user {
        Some(user) => Some(CartView::new(
            CartRepository::new(state.pool()).lines(user.id).await?,
        )),
        None => None,
    };

    Ok(CartShowTemplate {
        page,
        cart,
        max_quantity: MAX_LINE_QUANTITY,
    })
}

/// Set the quantity of a cart line. Quantity 0 removes the line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let carts = CartRepository::new(state.pool());

    if form.quantity == 0 {
        carts.remove(user.id, form.item_id).await?;
        set_flash(&session, Flash::success("Item removed from cart.")).await;
        return Ok(Redirect::to("/cart"));
    }

    if !is_valid_line_quantity(form.quantity) {
        set_flash(&session, Flash::error("Please choose a quantity between 1 and 10.")).await;
        return Ok(Redirect::to("/cart"));
    }

    match carts.set_quantity(user.id, form.item_id, form.quantity).await {
        Ok(()) => set_flash(&session, Flash::success("Cart updated.")).await,
        Err(RepositoryError::NotFound) => {
            set_flash(&session, Flash::error("That item is no longer in your cart.")).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    if CartRepository::new(state.pool())
        .remove(user.id, form.item_id)
        .await?
    {
        set_flash(&session, Flash::success("Item removed from cart.")).await;
    }

    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment.
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let count = match user {
        Some(user) => CartRepository::new(state.pool()).item_count(user.id).await?,
        None => 0,
    };

    Ok(CartCountTemplate { count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bazaar_core::ProductId;

    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let line = |id: i32, cents: i64, quantity: i32| CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            variant_id: None,
            product_name: format!("Product {id}"),
            variant_name: None,
            product_price: Decimal::new(cents, 2),
            variant_price: None,
            quantity,
            image_url: None,
        };

        let view = CartView::new(vec![line(1, 1000, 2), line(2, 500, 1)]);

        assert!(!view.is_empty());
        assert_eq!(view.item_count, 3);
        assert_eq!(view.totals.subtotal, Decimal::new(2500, 2));
        assert_eq!(view.totals.total, Decimal::new(2700, 2));
    }

    #[tokio::test]
    async fn test_update_form_parses_ids() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("item_id=7&quantity=0"))
            .unwrap();

        let Form(form) = Form::<UpdateCartForm>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(form.item_id, CartItemId::new(7));
        assert_eq!(form.quantity, 0);
    }
}
