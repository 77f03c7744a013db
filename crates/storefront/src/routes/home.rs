//! Home page and not-found handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::PageContext;
use crate::error::Result;
use crate::filters;
use crate::models::ProductSummary;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductSummary>,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
}

impl NotFoundTemplate {
    /// The 404 page as a response with the matching status code.
    pub fn response(page: PageContext) -> Response {
        (StatusCode::NOT_FOUND, Self { page }).into_response()
    }
}

/// Display the home page with featured products.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let featured = state.catalog().featured(state.pool()).await?;

    Ok(HomeTemplate { page, featured })
}

/// Render the 404 page.
pub async fn not_found(page: PageContext) -> Response {
    NotFoundTemplate::response(page)
}
