use {
    super::address::Address,
    super::error::CheckoutError,
    super::id::{OrderNumber, PayerId, Token},
    super::money::Money,
    super::shipping::ShippingMethod,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Settled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "settled" => Ok(Self::Settled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CheckoutError::Validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    number: OrderNumber,
    basket_id: Uuid,
    status: OrderStatus,
    total: Money,
    guest_email: Option<String>,
    placed_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        number: OrderNumber,
        basket_id: Uuid,
        total: Money,
        guest_email: Option<String>,
    ) -> Self {
        Self {
            number,
            basket_id,
            status: OrderStatus::Pending,
            total,
            guest_email,
            placed_at: Utc::now(),
        }
    }

    pub fn number(&self) -> &OrderNumber {
        &self.number
    }

    pub fn basket_id(&self) -> Uuid {
        self.basket_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn guest_email(&self) -> Option<&str> {
        self.guest_email.as_deref()
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

/// Funds allocated against an order when the capture phase begins.
/// Allocated and debited are equal here: the gateway captures in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSource {
    pub order: OrderNumber,
    pub allocated: Money,
    pub debited: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    Settled,
    Failure,
}

impl PaymentEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Failure => "failure",
        }
    }
}

/// One settlement outcome. The reference is the gateway's correlation id —
/// the join key for reconciling transactions against orders later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub order: OrderNumber,
    pub kind: PaymentEventKind,
    pub amount: Money,
    pub reference: Option<String>,
}

impl PaymentEvent {
    pub fn settled(order: OrderNumber, amount: Money, reference: Option<String>) -> Self {
        Self {
            order,
            kind: PaymentEventKind::Settled,
            amount,
            reference,
        }
    }

    pub fn failure(order: OrderNumber, amount: Money, reference: Option<String>) -> Self {
        Self {
            order,
            kind: PaymentEventKind::Failure,
            amount,
            reference,
        }
    }
}

/// Everything the external order-placement collaborator needs to create an
/// order from a confirmed preview.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub basket_id: Uuid,
    pub guest_email: Option<String>,
    pub payer_id: PayerId,
    pub token: Token,
    pub total: Money,
    pub shipping_method: Option<ShippingMethod>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}
