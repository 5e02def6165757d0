mod common;

use common::*;
use express_checkout::domain::address::{Address, CountryCode};
use express_checkout::domain::basket::{Basket, BasketLine, BasketStatus};
use express_checkout::domain::context::SessionContext;
use express_checkout::domain::error::GatewayError;
use express_checkout::domain::id::Token;
use express_checkout::domain::money::Currency;
use express_checkout::domain::outcome::{Destination, Severity};
use express_checkout::domain::stores::TransactionLedger;
use express_checkout::domain::transaction::ApiMethod;

fn german_address() -> Address {
    Address {
        name: Some("Erika Mustermann".into()),
        line1: Some("Heidestrasse 17".into()),
        line2: None,
        city: Some("Köln".into()),
        state: None,
        postcode: Some("51147".into()),
        country: CountryCode::parse("DE").unwrap(),
    }
}

// ── 1. empty_basket_is_rejected_and_stays_open ─────────────────────────────

#[tokio::test]
async fn empty_basket_is_rejected_and_stays_open() {
    let h = harness();
    let basket = empty_basket(Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;

    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    assert_eq!(outcome.destination, Destination::BasketSummary);
    let flash = outcome.message.unwrap();
    assert_eq!(flash.severity, Severity::Error);
    assert_eq!(flash.text, "Your basket is empty");

    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
    assert_eq!(h.ledger.snapshot_count().await, 0);
    assert!(h.ledger.records().await.is_empty());
}

// ── 2. successful_initiate_freezes_basket_and_stores_snapshot ──────────────

#[tokio::test]
async fn successful_initiate_freezes_basket_and_stores_snapshot() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.gateway.push(Ok(initiate_ok("EC-7VY61234XW123456M"))).await;

    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    let Destination::Gateway(url) = outcome.destination else {
        panic!("expected gateway redirect, got {:?}", outcome.destination);
    };
    assert!(url.contains("token=EC-7VY61234XW123456M"));

    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Frozen));
    assert_eq!(h.ledger.snapshot_count().await, 1);

    let token = Token::new("EC-7VY61234XW123456M").unwrap();
    let snapshot = h.ledger.find_snapshot(&token).await.unwrap().unwrap();
    assert_eq!(snapshot.basket(), Some(basket_id));

    let records = h.ledger.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method(), ApiMethod::SetExpressCheckout);
    assert!(records[0].is_successful());
}

// ── 3. gateway_decline_is_recorded_and_leaves_basket_open ──────────────────

#[tokio::test]
async fn gateway_decline_is_recorded_and_leaves_basket_open() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.gateway
        .push(Ok(declined(
            ApiMethod::SetExpressCheckout,
            "10001",
            None,
            "Internal Error",
        )))
        .await;

    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    assert_eq!(outcome.destination, Destination::BasketSummary);
    assert_eq!(
        outcome.message.unwrap().text,
        "An error occurred communicating with PayPal"
    );

    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
    assert_eq!(h.ledger.snapshot_count().await, 0);

    // The failed exchange still lands in the ledger.
    let records = h.ledger.records().await;
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_successful());
    assert_eq!(records[0].error_code(), Some("10001"));
}

// ── 4. transport_failure_redirects_without_freezing ────────────────────────

#[tokio::test]
async fn transport_failure_redirects_without_freezing() {
    let h = harness();
    let basket = shippable_basket("12.00", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.gateway
        .push(Err(GatewayError::Transport("connection refused".into())))
        .await;

    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    assert_eq!(outcome.destination, Destination::BasketSummary);
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
    // No response was received, so there is nothing to record.
    assert!(h.ledger.records().await.is_empty());
}

// ── 5. checkout_entry_requires_shipping_address ────────────────────────────

#[tokio::test]
async fn checkout_entry_requires_shipping_address() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;

    let outcome = h
        .checkout
        .initiate(basket_id, true, &SessionContext::anonymous())
        .await
        .unwrap();

    assert_eq!(outcome.destination, Destination::ShippingAddressForm);
    assert_eq!(
        outcome.message.unwrap().text,
        "A shipping address must be specified"
    );
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
}

// ── 6. checkout_entry_requires_shipping_method ─────────────────────────────

#[tokio::test]
async fn checkout_entry_requires_shipping_method() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;

    let ctx = SessionContext {
        shipping_address: Some(german_address()),
        ..SessionContext::anonymous()
    };
    let outcome = h.checkout.initiate(basket_id, true, &ctx).await.unwrap();

    assert_eq!(outcome.destination, Destination::ShippingMethodForm);
    assert_eq!(
        outcome.message.unwrap().text,
        "A shipping method must be specified"
    );
}

// ── 7. checkout_entry_with_fixed_shipping_succeeds ─────────────────────────

#[tokio::test]
async fn checkout_entry_with_fixed_shipping_succeeds() {
    let h = harness();
    let basket = shippable_basket("49.99", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.gateway.push(Ok(initiate_ok("EC-FIXED1"))).await;

    let ctx = SessionContext {
        shipping_address: Some(german_address()),
        shipping_method: Some(method("standard", "Standard delivery", "3.95", Currency::Gbp)),
        email: Some("erika@example.com".into()),
        ..SessionContext::anonymous()
    };
    let outcome = h.checkout.initiate(basket_id, true, &ctx).await.unwrap();

    assert!(matches!(outcome.destination, Destination::Gateway(_)));
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Frozen));

    // The snapshot carries the session context for the return leg.
    let token = Token::new("EC-FIXED1").unwrap();
    let snapshot = h.ledger.find_snapshot(&token).await.unwrap().unwrap();
    assert_eq!(snapshot.email(), Some("erika@example.com"));
    assert_eq!(
        snapshot.shipping_address().unwrap().country,
        CountryCode::parse("DE").unwrap()
    );
}

// ── 8. repeated_initiate_creates_a_new_remote_session_each_time ────────────

#[tokio::test]
async fn repeated_initiate_creates_a_new_remote_session_each_time() {
    let h = harness();
    let basket = shippable_basket("5.00", Currency::Gbp);
    let basket_id = basket.id();
    h.baskets.insert(basket).await;
    h.gateway.push(Ok(initiate_ok("EC-FIRST"))).await;
    h.gateway.push(Ok(initiate_ok("EC-SECOND"))).await;

    h.checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();
    // No dedup: the second attempt opens a fresh remote session. Only the
    // record matching the token the buyer eventually returns with is ever
    // acted on downstream.
    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    let Destination::Gateway(url) = outcome.destination else {
        panic!("expected gateway redirect");
    };
    assert!(url.contains("token=EC-SECOND"));
    assert_eq!(h.ledger.records().await.len(), 2);
    assert_eq!(h.ledger.snapshot_count().await, 2);
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Frozen));
}

// ── 9. mixed_currency_basket_is_rejected_with_a_warning ────────────────────

#[tokio::test]
async fn mixed_currency_basket_is_rejected_with_a_warning() {
    let h = harness();
    let basket = Basket::new(
        uuid::Uuid::now_v7(),
        None,
        Currency::Gbp,
        vec![
            BasketLine {
                title: "Widget".into(),
                quantity: 1,
                unit_price: money("5.00", Currency::Gbp),
            },
            BasketLine {
                title: "Import".into(),
                quantity: 1,
                unit_price: money("5.00", Currency::Usd),
            },
        ],
        true,
    );
    let basket_id = basket.id();
    h.baskets.insert(basket).await;

    let outcome = h
        .checkout
        .initiate(basket_id, false, &SessionContext::anonymous())
        .await
        .unwrap();

    assert_eq!(outcome.destination, Destination::BasketSummary);
    let flash = outcome.message.unwrap();
    assert_eq!(flash.severity, Severity::Warning);
    assert!(flash.text.contains("GBP"));
    assert_eq!(h.baskets.status(basket_id).await, Some(BasketStatus::Open));
}
