//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use bazaar_core::{OrderId, StatusTone, order_status_tone, payment_status_tone};

use super::PageContext;
use super::home::NotFoundTemplate;
use crate::db::OrderRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderLine, OrderSummary};
use crate::state::AppState;

/// Order history row with badge tones resolved.
pub struct OrderRow {
    pub order: OrderSummary,
    pub status_tone: StatusTone,
    pub payment_tone: StatusTone,
}

impl From<OrderSummary> for OrderRow {
    fn from(order: OrderSummary) -> Self {
        Self {
            status_tone: order_status_tone(&order.status),
            payment_tone: payment_status_tone(&order.payment_status),
            order,
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrderIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderRow>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Display the user's orders, newest first.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(OrderRow::from)
        .collect();

    Ok(OrderIndexTemplate { page, orders })
}

/// Display one of the user's orders. Other users' orders render as not found.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    page: PageContext,
) -> Result<Response> {
    let Some((order, lines)) = OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
    else {
        return Ok(NotFoundTemplate::response(page));
    };

    Ok(OrderShowTemplate { page, order, lines }.into_response())
}
