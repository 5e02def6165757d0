use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    express_checkout::{
        AppState,
        adapters::{http as checkout_http, paypal::PayPalNvp},
        config::ExpressConfig,
        domain::{
            money::{Amount, Money},
            shipping::ShippingMethod,
            stores::{BasketStore, OrderStore, TransactionLedger},
        },
        infra::{
            memory::{MemoryBasketStore, MemoryOrderStore},
            postgres::ledger_repo::PgLedger,
            shipping::StaticShippingTable,
        },
        services::checkout::CheckoutOrchestrator,
    },
    rust_decimal::Decimal,
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::signal,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = ExpressConfig::from_env();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let gateway = Arc::new(
        PayPalNvp::new(config.gateway.clone()).expect("failed to build gateway client"),
    );
    let ledger: Arc<dyn TransactionLedger> = Arc::new(PgLedger::new(pool));

    // Reference stores and rates — a host shop wires its own basket/order
    // persistence and rate engine behind the same traits.
    let baskets: Arc<dyn BasketStore> = Arc::new(MemoryBasketStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
    let standard = Money::new(
        Amount::new(Decimal::new(395, 2)).expect("standard rate"),
        config.currency,
    );
    let express = Money::new(
        Amount::new(Decimal::new(995, 2)).expect("express rate"),
        config.currency,
    );
    let shipping = Arc::new(StaticShippingTable::new(vec![
        ShippingMethod {
            code: "standard".into(),
            name: "Standard delivery".into(),
            charge: standard,
        },
        ShippingMethod {
            code: "express".into(),
            name: "Express delivery".into(),
            charge: express,
        },
    ]));

    let checkout = Arc::new(CheckoutOrchestrator::new(
        gateway,
        ledger,
        baskets.clone(),
        orders,
        shipping.clone(),
        config,
    ));
    let state = AppState {
        checkout,
        baskets,
        shipping,
    };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/checkout/paypal/redirect/{basket_id}",
            get(checkout_http::begin),
        )
        .route(
            "/checkout/paypal/cancel/{basket_id}",
            get(checkout_http::cancel_return),
        )
        .route(
            "/checkout/paypal/success/{basket_id}",
            get(checkout_http::success_return),
        )
        .route(
            "/checkout/paypal/place-order/{basket_id}",
            post(checkout_http::place_order),
        )
        .route(
            "/checkout/paypal/payment/{order_number}",
            get(checkout_http::handle_payment),
        )
        .route(
            "/checkout/paypal/shipping-options/{basket_id}",
            post(checkout_http::shipping_options),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(DefaultBodyLimit::max(64 * 1024)) // gateway callbacks are small
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("listening on 0.0.0.0:3000");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
