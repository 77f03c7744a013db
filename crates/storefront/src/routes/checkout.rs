//! Checkout route handlers.
//!
//! `GET /checkout` shows the cart summary and address form; `POST /checkout`
//! places the order. On failure the form is rendered again with the entered
//! values so the user can fix it and resubmit.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{PricedLine, UserId};

use super::PageContext;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::Flash;
use crate::services::checkout::{AddressFields, CheckoutSummary, ORDER_FAILED_MESSAGE};
use crate::services::{CheckoutError, CheckoutRequest, CheckoutService, PgCheckoutStore};
use crate::state::AppState;

/// Checkout form data.
///
/// Browsers omit unchecked checkboxes, so `billing_same_as_shipping` is
/// present only when ticked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub shipping_full_name: String,
    pub shipping_address_line_1: String,
    pub shipping_address_line_2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub shipping_phone: String,
    pub billing_same_as_shipping: Option<String>,
    pub billing_full_name: String,
    pub billing_address_line_1: String,
    pub billing_address_line_2: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_postal_code: String,
    pub billing_country: String,
    pub billing_phone: String,
    pub notes: String,
}

impl CheckoutForm {
    /// An empty form with "billing same as shipping" ticked.
    fn blank() -> Self {
        Self {
            billing_same_as_shipping: Some("on".to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn billing_same(&self) -> bool {
        self.billing_same_as_shipping.is_some()
    }

    fn to_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            shipping: AddressFields {
                full_name: self.shipping_full_name.clone(),
                address_line_1: self.shipping_address_line_1.clone(),
                address_line_2: self.shipping_address_line_2.clone(),
                city: self.shipping_city.clone(),
                state: self.shipping_state.clone(),
                postal_code: self.shipping_postal_code.clone(),
                country: self.shipping_country.clone(),
                phone: self.shipping_phone.clone(),
            },
            billing_same_as_shipping: self.billing_same(),
            billing: AddressFields {
                full_name: self.billing_full_name.clone(),
                address_line_1: self.billing_address_line_1.clone(),
                address_line_2: self.billing_address_line_2.clone(),
                city: self.billing_city.clone(),
                state: self.billing_state.clone(),
                postal_code: self.billing_postal_code.clone(),
                country: self.billing_country.clone(),
                phone: self.billing_phone.clone(),
            },
            notes: Some(self.notes.clone()),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub summary: CheckoutSummary,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

fn checkout_service(state: &AppState) -> CheckoutService<PgCheckoutStore<'_>> {
    CheckoutService::new(PgCheckoutStore::new(state.pool()))
}

async fn render_form(
    state: &AppState,
    session: &Session,
    user_id: UserId,
    page: PageContext,
    form: CheckoutForm,
    error: Option<String>,
) -> Result<Response> {
    let summary = match checkout_service(state).summary(user_id).await {
        Ok(summary) => summary,
        Err(CheckoutError::EmptyCart) => {
            set_flash(session, Flash::error("Your cart is empty.")).await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CheckoutTemplate {
        page,
        summary,
        form,
        error,
    }
    .into_response())
}

/// Display the checkout form. An empty cart redirects to `/cart`.
#[instrument(skip(state, session, user, page), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<Response> {
    render_form(&state, &session, user.id, page, CheckoutForm::blank(), None).await
}

/// Place the order for the current cart.
#[instrument(skip(state, session, user, page, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let request = form.to_request();

    match checkout_service(&state).place_order(user.id, &request).await {
        Ok(receipt) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_number", receipt.order_number.as_str())]),
            );
            set_flash(
                &session,
                Flash::success(format!("Order {} placed successfully!", receipt.order_number)),
            )
            .await;
            Ok(Redirect::to(&format!("/orders/{}", receipt.order_id)).into_response())
        }
        Err(CheckoutError::EmptyCart) => {
            set_flash(&session, Flash::error("Your cart is empty.")).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(CheckoutError::InvalidAddress(e)) => {
            let message = format!("Please check your address: {e}.");
            let mut response =
                render_form(&state, &session, user.id, page, form, Some(message)).await?;
            if response.status() == StatusCode::OK {
                *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
            }
            Ok(response)
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to place order");
            render_form(
                &state,
                &session,
                user.id,
                page,
                form,
                Some(ORDER_FAILED_MESSAGE.to_string()),
            )
            .await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            shipping_full_name: "Ada Lovelace".to_string(),
            shipping_address_line_1: "12 St James's Square".to_string(),
            shipping_city: "London".to_string(),
            shipping_state: "LDN".to_string(),
            shipping_postal_code: "SW1Y 4JH".to_string(),
            shipping_country: "GB".to_string(),
            billing_city: "Elsewhere".to_string(),
            ..CheckoutForm::blank()
        }
    }

    #[test]
    fn test_blank_form_defaults_to_same_billing() {
        assert!(CheckoutForm::blank().billing_same());
        assert!(!CheckoutForm::default().billing_same());
    }

    #[test]
    fn test_form_maps_to_request() {
        let request = filled_form().to_request();

        assert!(request.billing_same_as_shipping);
        assert_eq!(request.shipping.city, "London");
        assert_eq!(request.billing.city, "Elsewhere");

        let (shipping, billing) = request.resolve_addresses().unwrap();
        assert_eq!(shipping, billing);
    }

    #[test]
    fn test_unticked_billing_uses_billing_fields() {
        let form = CheckoutForm {
            billing_same_as_shipping: None,
            ..filled_form()
        };
        let request = form.to_request();

        assert!(!request.billing_same_as_shipping);
        assert!(request.resolve_addresses().is_err());
    }
}
