#![allow(dead_code)]

use async_trait::async_trait;
use express_checkout::config::{Environment, ExpressConfig, GatewayConfig};
use express_checkout::domain::basket::{Basket, BasketLine};
use express_checkout::domain::error::GatewayError;
use express_checkout::domain::gateway::{GatewayClient, GatewayExchange, InitiateParams};
use express_checkout::domain::id::{PayerId, Token};
use express_checkout::domain::money::{Amount, Currency, Money};
use express_checkout::domain::shipping::ShippingMethod;
use express_checkout::domain::transaction::{Ack, ApiMethod};
use express_checkout::infra::memory::{MemoryBasketStore, MemoryLedger, MemoryOrderStore};
use express_checkout::infra::shipping::StaticShippingTable;
use express_checkout::services::checkout::CheckoutOrchestrator;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn money(amount: &str, currency: Currency) -> Money {
    Money::new(Amount::parse(amount).unwrap(), currency)
}

pub fn method(code: &str, name: &str, charge: &str, currency: Currency) -> ShippingMethod {
    ShippingMethod {
        code: code.to_string(),
        name: name.to_string(),
        charge: money(charge, currency),
    }
}

/// Single-line basket whose total equals `total`.
pub fn shippable_basket(total: &str, currency: Currency) -> Basket {
    Basket::new(
        Uuid::now_v7(),
        None,
        currency,
        vec![BasketLine {
            title: "Widget".to_string(),
            quantity: 1,
            unit_price: money(total, currency),
        }],
        true,
    )
}

pub fn empty_basket(currency: Currency) -> Basket {
    Basket::new(Uuid::now_v7(), None, currency, Vec::new(), true)
}

// ── Scripted gateway double ────────────────────────────────────────────────

/// Gateway that plays back a queue of prepared results, in order. A test
/// that triggers more calls than it scripted panics — that in itself is an
/// assertion about how many round trips a phase makes.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<GatewayExchange, GatewayError>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push(&self, step: Result<GatewayExchange, GatewayError>) {
        self.script.lock().await.push_back(step);
    }

    async fn next(&self) -> Result<GatewayExchange, GatewayError> {
        self.script
            .lock()
            .await
            .pop_front()
            .expect("scripted gateway exhausted: unexpected gateway call")
    }
}

#[async_trait]
impl GatewayClient for ScriptedGateway {
    async fn initiate(&self, _params: &InitiateParams) -> Result<GatewayExchange, GatewayError> {
        self.next().await
    }

    async fn fetch_details(&self, _token: &Token) -> Result<GatewayExchange, GatewayError> {
        self.next().await
    }

    async fn confirm(
        &self,
        _payer_id: &PayerId,
        _token: &Token,
        _amount: &Money,
    ) -> Result<GatewayExchange, GatewayError> {
        self.next().await
    }

    fn checkout_url(&self, token: &Token) -> String {
        format!(
            "https://www.sandbox.paypal.com/webscr?cmd=_express-checkout&token={}",
            token.as_str()
        )
    }
}

// ── Exchange builders ──────────────────────────────────────────────────────

pub fn exchange(method: ApiMethod, ack: Ack) -> GatewayExchange {
    GatewayExchange {
        method,
        version: "119".to_string(),
        ack,
        token: None,
        correlation_id: None,
        error_code: None,
        error_message: None,
        amount: None,
        raw_request: format!(
            "METHOD={}&VERSION=119&USER=merchant_api1.example.com&PWD=secret123&SIGNATURE=AbC.xyz",
            method.as_str()
        ),
        raw_response: "ACK=Success".to_string(),
        fields: HashMap::new(),
    }
}

pub fn initiate_ok(token: &str) -> GatewayExchange {
    let mut exchange = exchange(ApiMethod::SetExpressCheckout, Ack::Success);
    exchange.token = Some(token.to_string());
    exchange
}

pub fn details_ok(amount: &str, currency: Currency, email: &str, payer: &str) -> GatewayExchange {
    let mut exchange = exchange(ApiMethod::GetExpressCheckoutDetails, Ack::Success);
    exchange.amount = Some(money(amount, currency));
    exchange
        .fields
        .insert("EMAIL".to_string(), email.to_string());
    exchange
        .fields
        .insert("PAYERID".to_string(), payer.to_string());
    exchange
}

pub fn confirm_ok(amount: &str, currency: Currency, correlation_id: &str) -> GatewayExchange {
    let mut exchange = exchange(ApiMethod::DoExpressCheckoutPayment, Ack::Success);
    exchange.amount = Some(money(amount, currency));
    exchange.correlation_id = Some(correlation_id.to_string());
    exchange
}

pub fn declined(
    method: ApiMethod,
    code: &str,
    correlation_id: Option<&str>,
    message: &str,
) -> GatewayExchange {
    let mut exchange = exchange(method, Ack::Failure);
    exchange.error_code = Some(code.to_string());
    exchange.error_message = Some(message.to_string());
    exchange.correlation_id = correlation_id.map(str::to_string);
    exchange
}

// ── Orchestrator harness ───────────────────────────────────────────────────

pub struct Harness {
    pub checkout: CheckoutOrchestrator,
    pub gateway: Arc<ScriptedGateway>,
    pub ledger: Arc<MemoryLedger>,
    pub baskets: Arc<MemoryBasketStore>,
    pub orders: Arc<MemoryOrderStore>,
}

pub fn test_config() -> ExpressConfig {
    ExpressConfig {
        gateway: GatewayConfig {
            environment: Environment::Sandbox,
            username: "merchant_api1.example.com".to_string(),
            password: "secret123".to_string(),
            signature: "AbC.xyz".to_string(),
            version: "119".to_string(),
        },
        site_base_url: "https://shop.example.com".to_string(),
        callback_host: None,
        currency: Currency::Gbp,
    }
}

pub fn harness_with_resolver(resolver: StaticShippingTable) -> Harness {
    let gateway = Arc::new(ScriptedGateway::new());
    let ledger = Arc::new(MemoryLedger::new());
    let baskets = Arc::new(MemoryBasketStore::new());
    let orders = Arc::new(MemoryOrderStore::new());
    let checkout = CheckoutOrchestrator::new(
        gateway.clone(),
        ledger.clone(),
        baskets.clone(),
        orders.clone(),
        Arc::new(resolver),
        test_config(),
    );
    Harness {
        checkout,
        gateway,
        ledger,
        baskets,
        orders,
    }
}

pub fn harness() -> Harness {
    harness_with_resolver(StaticShippingTable::new(vec![
        method("standard", "Standard delivery", "3.95", Currency::Gbp),
        method("express", "Express delivery", "9.95", Currency::Gbp),
    ]))
}
