//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::WishlistItemId;

use super::PageContext;
use crate::db::{CartRepository, RepositoryError, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::{Flash, WishlistEntry};
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub entries: Vec<WishlistEntry>,
}

/// Display the user's wishlist, newest first.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let entries = WishlistRepository::new(state.pool()).list(user.id).await?;

    Ok(WishlistTemplate { page, entries })
}

/// Remove an entry from the wishlist.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WishlistItemId>,
) -> Result<Redirect> {
    if WishlistRepository::new(state.pool())
        .remove(user.id, id)
        .await?
    {
        set_flash(&session, Flash::success("Removed from wishlist.")).await;
    }

    Ok(Redirect::to("/wishlist"))
}

/// Add a wishlisted product to the cart with quantity 1.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WishlistItemId>,
) -> Result<Redirect> {
    let Some(product_id) = WishlistRepository::new(state.pool())
        .product_for(user.id, id)
        .await?
    else {
        set_flash(&session, Flash::error("That item is no longer in your wishlist.")).await;
        return Ok(Redirect::to("/wishlist"));
    };

    let stock = match state
        .catalog()
        .ensure_purchasable(state.pool(), product_id, None)
        .await
    {
        Ok(stock) => stock,
        Err(RepositoryError::NotFound) => {
            set_flash(&session, Flash::error("That product is no longer available.")).await;
            return Ok(Redirect::to("/wishlist"));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(message) = stock.shortfall(1) {
        set_flash(&session, Flash::error(message)).await;
        return Ok(Redirect::to("/wishlist"));
    }

    CartRepository::new(state.pool())
        .add(user.id, product_id, None, 1)
        .await?;

    set_flash(&session, Flash::success("Added to cart.")).await;
    Ok(Redirect::to("/wishlist"))
}
