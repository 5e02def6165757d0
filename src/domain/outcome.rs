use {
    super::basket::Basket,
    super::id::{OrderNumber, PayerId, Token},
    super::money::Money,
    serde::Serialize,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// User-facing message attached to a redirect; the host presentation layer
/// renders it however it likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub severity: Severity,
    pub text: String,
}

impl Flash {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Arguments carried into the capture phase. The amount always comes from a
/// gateway response fetched server-side, never from the buyer's browser.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentArgs {
    pub order_number: OrderNumber,
    pub amount: Money,
    pub token: Token,
    pub payer_id: PayerId,
}

/// Where a phase sends the buyer next. The HTTP layer maps these to
/// concrete URLs; the orchestrator never builds host-site paths itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    BasketSummary,
    ShippingAddressForm,
    ShippingMethodForm,
    Preview {
        basket_id: Uuid,
        token: Token,
        payer_id: PayerId,
    },
    OrderStatus(OrderNumber),
    Payment(PaymentArgs),
    /// Off-site: the gateway's own checkout UI.
    Gateway(String),
    ThankYou,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub destination: Destination,
    pub message: Option<Flash>,
}

impl PhaseOutcome {
    pub fn to(destination: Destination) -> Self {
        Self {
            destination,
            message: None,
        }
    }

    pub fn with(destination: Destination, message: Flash) -> Self {
        Self {
            destination,
            message: Some(message),
        }
    }
}

/// Renderable payload for the confirmation screen. Not an order — nothing
/// durable is created until the buyer submits it.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewContext {
    pub basket_id: Uuid,
    pub token: Token,
    pub payer_id: PayerId,
    pub email: Option<String>,
    /// Buyer-visible transaction amount, as the gateway reported it.
    pub amount: Money,
    /// The reloaded frozen basket, repriced for display.
    pub basket: Basket,
}

/// The success-return entry point either renders a preview or redirects.
#[derive(Debug, Clone)]
pub enum SuccessReturn {
    Preview(PreviewContext),
    Redirect(PhaseOutcome),
}
