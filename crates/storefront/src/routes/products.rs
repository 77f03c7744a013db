//! Product route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{ProductId, VariantId};

use super::PageContext;
use super::home::NotFoundTemplate;
use crate::db::{CartRepository, RepositoryError, WishlistRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::catalog::is_valid_line_quantity;
use crate::models::{Flash, ProductDetail, ProductSummary, StockLevel};
use crate::state::AppState;

/// Add to cart form data.
///
/// The variant select submits an empty string for "no variant".
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub variant_id: String,
    pub quantity: u32,
}

impl AddToCartForm {
    fn variant_id(&self) -> Result<Option<VariantId>> {
        let raw = self.variant_id.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        raw.parse::<i32>()
            .map(|id| Some(VariantId::new(id)))
            .map_err(|_| AppError::BadRequest("invalid variant".to_string()))
    }
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductSummary>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub detail: Arc<ProductDetail>,
    pub stock: StockLevel,
}

/// Display all active products.
#[instrument(skip(state, page))]
pub async fn index(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let products = state.catalog().list(state.pool()).await?;

    Ok(ProductIndexTemplate { page, products })
}

/// Display a product with its images and variants.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    page: PageContext,
) -> Result<Response> {
    let Some(detail) = state.catalog().detail(state.pool(), id).await? else {
        return Ok(NotFoundTemplate::response(page));
    };

    let stock = StockLevel::from_quantity(detail.product.stock_quantity);

    Ok(ProductShowTemplate {
        page,
        detail,
        stock,
    }
    .into_response())
}

/// Add a product (optionally a variant of it) to the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&format!("/products/{id}"));

    if !is_valid_line_quantity(form.quantity) {
        set_flash(&session, Flash::error("Please choose a quantity between 1 and 10.")).await;
        return Ok(back);
    }

    let variant_id = form.variant_id()?;
    let stock = match state
        .catalog()
        .ensure_purchasable(state.pool(), id, variant_id)
        .await
    {
        Ok(stock) => stock,
        Err(RepositoryError::NotFound) => {
            set_flash(&session, Flash::error("That product is no longer available.")).await;
            return Ok(back);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(message) = stock.shortfall(form.quantity) {
        set_flash(&session, Flash::error(message)).await;
        return Ok(back);
    }

    CartRepository::new(state.pool())
        .add(user.id, id, variant_id, form.quantity)
        .await?;

    let product_id = id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    set_flash(&session, Flash::success("Added to cart.")).await;
    Ok(back)
}

/// Add a product to the wishlist. Adding it twice is a no-op.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let back = Redirect::to(&format!("/products/{id}"));

    match state.catalog().ensure_purchasable(state.pool(), id, None).await {
        Ok(_) => {}
        Err(RepositoryError::NotFound) => {
            set_flash(&session, Flash::error("That product is no longer available.")).await;
            return Ok(back);
        }
        Err(e) => return Err(e.into()),
    }

    let added = WishlistRepository::new(state.pool()).add(user.id, id).await?;

    let flash = if added {
        Flash::success("Added to wishlist.")
    } else {
        Flash::success("Already in your wishlist.")
    };
    set_flash(&session, flash).await;
    Ok(back)
}
