//! Order placement through `CheckoutService` against an in-memory store.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use bazaar_core::{AddressError, OrderNumber, UserId};
use bazaar_integration_tests::{MemoryCheckoutStore, cart_line};
use bazaar_storefront::services::checkout::{AddressFields, MAX_ORDER_NUMBER_ATTEMPTS};
use bazaar_storefront::services::{CheckoutError, CheckoutRequest, CheckoutService};

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);

fn shipping() -> AddressFields {
    AddressFields {
        full_name: "Ada Lovelace".to_string(),
        address_line_1: "12 St James's Square".to_string(),
        address_line_2: "Flat 3".to_string(),
        city: "London".to_string(),
        state: "LND".to_string(),
        postal_code: "SW1Y 4JH".to_string(),
        country: "GB".to_string(),
        phone: String::new(),
    }
}

fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping: shipping(),
        billing_same_as_shipping: true,
        billing: AddressFields::default(),
        notes: Some(" ring twice ".to_string()),
    }
}

/// $10.00 x 2 plus a $5.00 variant of a $4.00 product x 1: $25.00 subtotal.
fn service_with_cart() -> CheckoutService<MemoryCheckoutStore> {
    let store = MemoryCheckoutStore::new();
    store.set_cart(
        ALICE,
        vec![
            cart_line(1, "Pour-over Kettle", 1000, None, 2),
            cart_line(2, "Filter Papers", 400, Some(500), 1),
        ],
    );
    CheckoutService::new(store)
}

#[tokio::test]
async fn test_place_order_writes_header_lines_and_clears_cart() {
    let service = service_with_cart();

    let receipt = service.place_order(ALICE, &request()).await.unwrap();

    let orders = service.store().orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, receipt.order_id);
    assert_eq!(order.user_id, ALICE);
    assert_eq!(order.draft.order_number, receipt.order_number);
    assert_eq!(order.draft.notes.as_deref(), Some("ring twice"));

    assert_eq!(order.draft.lines.len(), 2);
    let kettle = &order.draft.lines[0];
    assert_eq!(kettle.product_name, "Pour-over Kettle");
    assert_eq!(kettle.quantity, 2);
    assert_eq!(kettle.unit_price, Decimal::new(1000, 2));
    assert_eq!(kettle.line_total, Decimal::new(2000, 2));
    let papers = &order.draft.lines[1];
    assert_eq!(papers.variant_name.as_deref(), Some("Large"));
    assert_eq!(papers.unit_price, Decimal::new(500, 2));

    assert!(service.store().cart(ALICE).is_empty());
}

#[tokio::test]
async fn test_line_added_during_checkout_stays_in_cart() {
    let service = service_with_cart();
    service
        .store()
        .add_after_next_load(ALICE, cart_line(7, "Burr Grinder", 9900, None, 1));

    service.place_order(ALICE, &request()).await.unwrap();

    let order = &service.store().orders()[0];
    assert_eq!(order.draft.lines.len(), 2);
    assert!(order.draft.lines.iter().all(|l| l.product_name != "Burr Grinder"));
    assert_eq!(order.draft.totals.subtotal, Decimal::new(2500, 2));

    let remaining = service.store().cart(ALICE);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_name, "Burr Grinder");
}

#[tokio::test]
async fn test_order_totals() {
    let service = service_with_cart();

    let summary = service.summary(ALICE).await.unwrap();
    assert_eq!(summary.totals.subtotal, Decimal::new(2500, 2));
    assert_eq!(summary.totals.tax, Decimal::new(200, 2));
    assert_eq!(summary.totals.shipping, Decimal::ZERO);
    assert_eq!(summary.totals.total, Decimal::new(2700, 2));

    service.place_order(ALICE, &request()).await.unwrap();
    let stored = &service.store().orders()[0].draft.totals;
    assert_eq!(*stored, summary.totals);
    assert_eq!(stored.total, stored.subtotal + stored.tax + stored.shipping);
}

#[tokio::test]
async fn test_billing_same_as_shipping_copies_address() {
    let service = service_with_cart();
    let mut request = request();
    request.billing = AddressFields {
        full_name: "Someone Else".to_string(),
        ..shipping()
    };

    service.place_order(ALICE, &request).await.unwrap();

    let draft = &service.store().orders()[0].draft;
    assert_eq!(draft.billing_address, draft.shipping_address);
    assert_eq!(draft.billing_address.full_name, "Ada Lovelace");
    assert_eq!(draft.shipping_address.address_line_2.as_deref(), Some("Flat 3"));
    assert_eq!(draft.shipping_address.phone, None);
}

#[tokio::test]
async fn test_separate_billing_address_is_kept() {
    let service = service_with_cart();
    let mut request = request();
    request.billing_same_as_shipping = false;
    request.billing = AddressFields {
        full_name: "Accounts Payable".to_string(),
        city: "Manchester".to_string(),
        ..shipping()
    };

    service.place_order(ALICE, &request).await.unwrap();

    let draft = &service.store().orders()[0].draft;
    assert_eq!(draft.billing_address.city, "Manchester");
    assert_eq!(draft.shipping_address.city, "London");
}

#[tokio::test]
async fn test_empty_cart_is_rejected_without_writing() {
    let service = service_with_cart();

    let err = service.place_order(BOB, &request()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(matches!(
        service.summary(BOB).await,
        Err(CheckoutError::EmptyCart)
    ));
    assert_eq!(service.store().commit_attempts(), 0);
    assert!(service.store().orders().is_empty());
}

#[tokio::test]
async fn test_invalid_address_leaves_cart_untouched() {
    let service = service_with_cart();
    let mut request = request();
    request.shipping.city = "   ".to_string();

    let err = service.place_order(ALICE, &request).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::InvalidAddress(AddressError::MissingField("city"))
    ));
    assert_eq!(service.store().commit_attempts(), 0);
    assert_eq!(service.store().cart(ALICE).len(), 2);
}

#[tokio::test]
async fn test_order_number_collision_is_retried() {
    let service = service_with_cart();
    service.store().collide_next(MAX_ORDER_NUMBER_ATTEMPTS - 1);

    let receipt = service.place_order(ALICE, &request()).await.unwrap();

    assert_eq!(service.store().commit_attempts(), MAX_ORDER_NUMBER_ATTEMPTS);
    assert_eq!(service.store().orders().len(), 1);
    assert_eq!(service.store().orders()[0].draft.order_number, receipt.order_number);
}

#[tokio::test]
async fn test_persistent_collisions_give_up() {
    let service = service_with_cart();
    service.store().collide_next(MAX_ORDER_NUMBER_ATTEMPTS);

    let err = service.place_order(ALICE, &request()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::DuplicateOrderNumber));
    assert_eq!(service.store().commit_attempts(), MAX_ORDER_NUMBER_ATTEMPTS);
    assert!(service.store().orders().is_empty());
    assert_eq!(service.store().cart(ALICE).len(), 2);
}

#[tokio::test]
async fn test_store_failure_is_not_retried() {
    let service = service_with_cart();
    service.store().fail_next(1);

    let err = service.place_order(ALICE, &request()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Repository(_)));
    assert_eq!(service.store().commit_attempts(), 1);
    assert_eq!(service.store().cart(ALICE).len(), 2);
}

#[tokio::test]
async fn test_each_order_gets_a_well_formed_unique_number() {
    let service = service_with_cart();
    let first = service.place_order(ALICE, &request()).await.unwrap();

    service.store().set_cart(ALICE, vec![cart_line(3, "Mug", 1800, None, 1)]);
    let second = service.place_order(ALICE, &request()).await.unwrap();

    assert_ne!(first.order_number, second.order_number);
    assert_ne!(first.order_id, second.order_id);
    for receipt in [&first, &second] {
        assert_eq!(
            OrderNumber::parse(receipt.order_number.as_str()).unwrap(),
            receipt.order_number
        );
    }
}
