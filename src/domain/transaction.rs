use {
    super::basket::Basket,
    super::context::SessionContext,
    super::gateway::GatewayExchange,
    super::id::Token,
    super::money::Money,
    chrono::{DateTime, Utc},
    once_cell::sync::Lazy,
    regex::Regex,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// The three gateway calls this flow ever makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiMethod {
    SetExpressCheckout,
    GetExpressCheckoutDetails,
    DoExpressCheckoutPayment,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetExpressCheckout => "SetExpressCheckout",
            Self::GetExpressCheckoutDetails => "GetExpressCheckoutDetails",
            Self::DoExpressCheckoutPayment => "DoExpressCheckoutPayment",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Acknowledgement status from the gateway. Anything the gateway reports
/// that is not a success form collapses to `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ack {
    Success,
    SuccessWithWarning,
    Failure,
}

impl Ack {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Success" => Self::Success,
            "SuccessWithWarning" => Self::SuccessWithWarning,
            _ => Self::Failure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::SuccessWithWarning => "SuccessWithWarning",
            Self::Failure => "Failure",
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithWarning)
    }
}

static PWD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PWD=[^&]*&").expect("static credential pattern"));

/// Mask the API password in a raw request payload before it is persisted.
pub fn redact_credentials(raw: &str) -> String {
    PWD_PAIR.replace_all(raw, "PWD=XXXXXX&").into_owned()
}

/// One gateway request/response pair, kept forever for audit. Created on
/// every outbound call, successful or not; never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: Uuid,
    method: ApiMethod,
    version: String,
    amount: Option<Money>,
    ack: Ack,
    correlation_id: Option<String>,
    token: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
    raw_request: String,
    raw_response: String,
    created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Capture an exchange for the ledger. Credentials are redacted here,
    /// at write time, so no persisted form ever carries them.
    pub fn from_exchange(exchange: &GatewayExchange) -> Self {
        Self {
            id: Uuid::now_v7(),
            method: exchange.method,
            version: exchange.version.clone(),
            amount: exchange.amount,
            ack: exchange.ack,
            correlation_id: exchange.correlation_id.clone(),
            token: exchange.token.clone(),
            error_code: exchange.error_code.clone(),
            error_message: exchange.error_message.clone(),
            raw_request: redact_credentials(&exchange.raw_request),
            raw_response: exchange.raw_response.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> ApiMethod {
        self.method
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn amount(&self) -> Option<&Money> {
        self.amount.as_ref()
    }

    pub fn ack(&self) -> Ack {
        self.ack
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn raw_request(&self) -> &str {
        &self.raw_request
    }

    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_successful(&self) -> bool {
        self.ack.is_successful()
    }
}

/// Session context captured at initiation, keyed by the gateway token.
/// The return and capture phases read it to recover the buyer's email and
/// addresses when the host session is gone; it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthSnapshot {
    token: Token,
    email: Option<String>,
    billing_address: Option<serde_json::Value>,
    shipping_address: Option<serde_json::Value>,
    cart: Option<serde_json::Value>,
    customer: Option<Uuid>,
    basket: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl PreAuthSnapshot {
    pub fn capture(
        token: Token,
        basket: &Basket,
        ctx: &SessionContext,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            token,
            email: ctx.email.clone(),
            billing_address: ctx
                .billing_address
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            shipping_address: ctx
                .shipping_address
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            cart: Some(serde_json::to_value(basket.lines())?),
            customer: ctx.customer,
            basket: Some(basket.id()),
            created_at: Utc::now(),
        })
    }

    /// Rebuild a snapshot from persisted parts (ledger reads).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        token: Token,
        email: Option<String>,
        billing_address: Option<serde_json::Value>,
        shipping_address: Option<serde_json::Value>,
        cart: Option<serde_json::Value>,
        customer: Option<Uuid>,
        basket: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            email,
            billing_address,
            shipping_address,
            cart,
            customer,
            basket,
            created_at,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn billing_address_json(&self) -> Option<&serde_json::Value> {
        self.billing_address.as_ref()
    }

    pub fn shipping_address_json(&self) -> Option<&serde_json::Value> {
        self.shipping_address.as_ref()
    }

    pub fn billing_address(&self) -> Option<super::address::Address> {
        self.billing_address
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn shipping_address(&self) -> Option<super::address::Address> {
        self.shipping_address
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn cart(&self) -> Option<&serde_json::Value> {
        self.cart.as_ref()
    }

    pub fn customer(&self) -> Option<Uuid> {
        self.customer
    }

    pub fn basket(&self) -> Option<Uuid> {
        self.basket
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
