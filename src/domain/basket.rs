use {
    super::error::CheckoutError,
    super::money::{Amount, Currency, Money},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// Basket lifecycle around the off-site redirect window. A basket is frozen
/// the moment the buyer leaves for the gateway and thawed if they cancel, so
/// it cannot be edited while funds may already be reserved remotely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BasketStatus {
    Open,
    Frozen,
    Submitted,
}

impl BasketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Frozen => "frozen",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for BasketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for BasketStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "open" => Ok(Self::Open),
            "frozen" => Ok(Self::Frozen),
            "submitted" => Ok(Self::Submitted),
            other => Err(CheckoutError::Validation(format!(
                "unknown basket status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLine {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl BasketLine {
    pub fn total(&self) -> Result<Money, CheckoutError> {
        let amount = self
            .unit_price
            .amount()
            .checked_mul(self.quantity)
            .ok_or_else(|| CheckoutError::Validation("basket line total overflow".into()))?;
        Ok(Money::new(amount, self.unit_price.currency()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    id: Uuid,
    owner: Option<Uuid>,
    status: BasketStatus,
    currency: Currency,
    lines: Vec<BasketLine>,
    requires_shipping: bool,
    created_at: DateTime<Utc>,
}

impl Basket {
    pub fn new(
        id: Uuid,
        owner: Option<Uuid>,
        currency: Currency,
        lines: Vec<BasketLine>,
        requires_shipping: bool,
    ) -> Self {
        Self {
            id,
            owner,
            status: BasketStatus::Open,
            currency,
            lines,
            requires_shipping,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn status(&self) -> BasketStatus {
        self.status
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn requires_shipping(&self) -> bool {
        self.requires_shipping
    }

    pub fn total(&self) -> Result<Money, CheckoutError> {
        let mut sum = Amount::zero();
        for line in &self.lines {
            if line.unit_price.currency() != self.currency {
                return Err(CheckoutError::InvalidBasket(format!(
                    "basket is priced in {} but contains a {} line",
                    self.currency,
                    line.unit_price.currency()
                )));
            }
            sum = sum
                .checked_add(line.total()?.amount())
                .ok_or_else(|| CheckoutError::Validation("basket total overflow".into()))?;
        }
        Ok(Money::new(sum, self.currency))
    }

    /// Reserve the basket for the off-site redirect window. Unconditional:
    /// concurrent initiations are not mutually excluded, the last one wins.
    pub fn freeze(&mut self) {
        self.status = BasketStatus::Frozen;
    }

    /// Return a frozen basket to `Open`. A no-op for any other status, so
    /// repeated cancel callbacks never fail.
    pub fn thaw(&mut self) {
        if self.status == BasketStatus::Frozen {
            self.status = BasketStatus::Open;
        }
    }
}
