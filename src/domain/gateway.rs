use {
    super::address::Address,
    super::basket::BasketLine,
    super::error::GatewayError,
    super::id::{PayerId, Token},
    super::money::{Amount, Money},
    super::shipping::ShippingMethod,
    super::transaction::{Ack, ApiMethod},
    async_trait::async_trait,
    std::collections::HashMap,
};

/// Everything the initiation call sends to the gateway.
#[derive(Debug, Clone)]
pub struct InitiateParams {
    pub amount: Money,
    pub items: Vec<BasketLine>,
    pub return_url: String,
    pub cancel_url: String,
    /// Server-to-server shipping-options callback, when the basket ships.
    pub callback_url: Option<String>,
    pub buyer_email: Option<String>,
    /// Checkout already collected an address — the gateway must not let the
    /// buyer change it.
    pub address_override: Option<Address>,
    /// Charge for the method checkout already picked, if any.
    pub shipping_charge: Option<Amount>,
    /// Candidate methods offered on the gateway's own UI otherwise.
    pub shipping_options: Vec<ShippingMethod>,
    pub no_shipping: bool,
}

/// Full capture of one request/response pair with the gateway, parsed just
/// far enough for the ledger and the phase logic. A gateway-level decline
/// still yields an exchange — callers record it first, then branch.
#[derive(Debug, Clone)]
pub struct GatewayExchange {
    pub method: ApiMethod,
    pub version: String,
    pub ack: Ack,
    pub token: Option<String>,
    pub correlation_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub amount: Option<Money>,
    pub raw_request: String,
    pub raw_response: String,
    pub fields: HashMap<String, String>,
}

impl GatewayExchange {
    pub fn is_successful(&self) -> bool {
        self.ack.is_successful()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn declined(&self) -> GatewayError {
        GatewayError::Declined {
            code: self.error_code.clone().unwrap_or_default(),
            correlation_id: self.correlation_id.clone(),
            message: self
                .error_message
                .clone()
                .unwrap_or_else(|| "gateway reported a failure".into()),
        }
    }

    /// Token of a successful initiation.
    pub fn require_token(&self) -> Result<Token, GatewayError> {
        if !self.is_successful() {
            return Err(self.declined());
        }
        let token = self
            .token
            .clone()
            .ok_or_else(|| GatewayError::Protocol("successful response without a token".into()))?;
        Token::new(token).map_err(|_| GatewayError::Protocol("empty token in response".into()))
    }
}

/// Parsed transaction state from `GetExpressCheckoutDetails` or
/// `DoExpressCheckoutPayment`.
#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub amount: Money,
    pub correlation_id: Option<String>,
    pub email: Option<String>,
    pub payer_id: Option<PayerId>,
    pub shipping_option_name: Option<String>,
    pub shipping_charge: Option<Amount>,
}

impl TryFrom<&GatewayExchange> for TransactionDetails {
    type Error = GatewayError;

    fn try_from(exchange: &GatewayExchange) -> Result<Self, Self::Error> {
        if !exchange.is_successful() {
            return Err(exchange.declined());
        }
        let amount = exchange
            .amount
            .ok_or_else(|| GatewayError::Protocol("response missing transaction amount".into()))?;
        Ok(Self {
            amount,
            correlation_id: exchange.correlation_id.clone(),
            email: exchange.value("EMAIL").map(str::to_string),
            payer_id: exchange
                .value("PAYERID")
                .and_then(|id| PayerId::new(id).ok()),
            shipping_option_name: exchange.value("SHIPPINGOPTIONNAME").map(str::to_string),
            shipping_charge: exchange
                .value("PAYMENTREQUEST_0_SHIPPINGAMT")
                .and_then(|raw| Amount::parse(raw).ok()),
        })
    }
}

/// The three-call protocol the orchestrator depends on. Implementations own
/// the wire format and endpoint selection; they know nothing about baskets
/// or orders.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// `SetExpressCheckout` — registers the transaction, yields a token.
    async fn initiate(&self, params: &InitiateParams) -> Result<GatewayExchange, GatewayError>;

    /// `GetExpressCheckoutDetails` — current remote state for a token.
    async fn fetch_details(&self, token: &Token) -> Result<GatewayExchange, GatewayError>;

    /// `DoExpressCheckoutPayment` — capture funds.
    async fn confirm(
        &self,
        payer_id: &PayerId,
        token: &Token,
        amount: &Money,
    ) -> Result<GatewayExchange, GatewayError>;

    /// Buyer-facing URL for the gateway's checkout UI for this token.
    fn checkout_url(&self, token: &Token) -> String;
}
