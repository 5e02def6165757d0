mod common;

use common::*;
use express_checkout::domain::basket::BasketStatus;
use express_checkout::domain::error::GatewayError;
use express_checkout::domain::id::OrderNumber;
use express_checkout::domain::money::Currency;
use express_checkout::domain::order::Order;
use express_checkout::domain::outcome::{Destination, SuccessReturn};
use express_checkout::domain::stores::{BasketStore, OrderStore};
use express_checkout::domain::transaction::ApiMethod;

// ── 1. missing_parameters_redirect_to_basket ───────────────────────────────

#[tokio::test]
async fn missing_parameters_redirect_to_basket() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.baskets.freeze(basket_id).await.unwrap();

    let result = h
        .checkout
        .handle_success_return(basket_id, None, Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Redirect(outcome) = result else {
        panic!("expected redirect");
    };
    assert_eq!(outcome.destination, Destination::BasketSummary);
    assert_eq!(
        outcome.message.unwrap().text,
        "Unable to determine PayPal transaction details"
    );
    // No gateway call was made (the scripted gateway is empty).
    assert!(h.ledger.records().await.is_empty());
}

// ── 2. fresh_return_renders_preview ────────────────────────────────────────

#[tokio::test]
async fn fresh_return_renders_preview() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.baskets.freeze(basket_id).await.unwrap();
    h.gateway
        .push(Ok(details_ok(
            "49.99",
            Currency::Gbp,
            "buyer@example.com",
            "PAYER1",
        )))
        .await;

    let result = h
        .checkout
        .handle_success_return(basket_id, Some("EC-RET1"), Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Preview(preview) = result else {
        panic!("expected preview");
    };
    assert_eq!(preview.basket_id, basket_id);
    assert_eq!(preview.token.as_str(), "EC-RET1");
    assert_eq!(preview.payer_id.as_str(), "PAYER1");
    assert_eq!(preview.email.as_deref(), Some("buyer@example.com"));
    assert_eq!(preview.amount, money("49.99", Currency::Gbp));

    // Preview is not an order: nothing durable changed besides the
    // GetExpressCheckoutDetails record.
    let records = h.ledger.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method(), ApiMethod::GetExpressCheckoutDetails);
    assert!(h.orders.find_by_basket(basket_id).await.unwrap().is_none());
}

// ── 3. duplicate_return_skips_preview_and_goes_to_capture ──────────────────

#[tokio::test]
async fn duplicate_return_skips_preview_and_goes_to_capture() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.baskets.freeze(basket_id).await.unwrap();

    let number = OrderNumber::new("100007").unwrap();
    h.orders
        .insert(Order::new(
            number.clone(),
            basket_id,
            money("49.99", Currency::Gbp),
            None,
        ))
        .await;
    h.gateway
        .push(Ok(details_ok(
            "49.99",
            Currency::Gbp,
            "buyer@example.com",
            "PAYER1",
        )))
        .await;

    let result = h
        .checkout
        .handle_success_return(basket_id, Some("EC-RET2"), Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Redirect(outcome) = result else {
        panic!("expected redirect to capture, not a second preview");
    };
    let Destination::Payment(args) = outcome.destination else {
        panic!("expected payment destination");
    };
    assert_eq!(args.order_number, number);
    assert_eq!(args.amount, money("49.99", Currency::Gbp));
    assert_eq!(args.token.as_str(), "EC-RET2");
}

// ── 4. details_failure_without_order_redirects_to_basket ───────────────────

#[tokio::test]
async fn details_failure_without_order_redirects_to_basket() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.baskets.freeze(basket_id).await.unwrap();
    h.gateway
        .push(Err(GatewayError::Transport("timed out".into())))
        .await;

    let result = h
        .checkout
        .handle_success_return(basket_id, Some("EC-RET3"), Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Redirect(outcome) = result else {
        panic!("expected redirect");
    };
    assert_eq!(outcome.destination, Destination::BasketSummary);
    assert_eq!(
        outcome.message.unwrap().text,
        "A problem occurred communicating with PayPal - please try again later"
    );
}

// ── 5. details_failure_with_order_redirects_to_order_status ────────────────

#[tokio::test]
async fn details_failure_with_order_redirects_to_order_status() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;

    let number = OrderNumber::new("100008").unwrap();
    h.orders
        .insert(Order::new(
            number.clone(),
            basket_id,
            money("49.99", Currency::Gbp),
            None,
        ))
        .await;
    h.gateway
        .push(Err(GatewayError::Transport("timed out".into())))
        .await;

    let result = h
        .checkout
        .handle_success_return(basket_id, Some("EC-RET4"), Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Redirect(outcome) = result else {
        panic!("expected redirect");
    };
    assert_eq!(outcome.destination, Destination::OrderStatus(number));
}

// ── 6. unfrozen_basket_cannot_be_previewed ─────────────────────────────────

#[tokio::test]
async fn unfrozen_basket_cannot_be_previewed() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    // Still Open: the buyer never actually left for the gateway.
    h.baskets.insert(basket).await;
    h.gateway
        .push(Ok(details_ok(
            "49.99",
            Currency::Gbp,
            "buyer@example.com",
            "PAYER1",
        )))
        .await;

    let result = h
        .checkout
        .handle_success_return(basket_id, Some("EC-RET5"), Some("PAYER1"))
        .await
        .unwrap();

    let SuccessReturn::Redirect(outcome) = result else {
        panic!("expected redirect");
    };
    assert_eq!(outcome.destination, Destination::BasketSummary);
    assert_eq!(
        outcome.message.unwrap().text,
        "No basket was found that corresponds to your PayPal transaction"
    );
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
}
