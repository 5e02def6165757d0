use {
    super::address::Address,
    super::basket::Basket,
    super::money::Money,
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub code: String,
    pub name: String,
    pub charge: Money,
}

impl ShippingMethod {
    /// Method reconstructed from what the gateway reports the buyer picked
    /// on its own UI. Only the name and charge survive the round trip.
    pub fn fixed_price(name: impl Into<String>, charge: Money) -> Self {
        Self {
            code: "fixed-price".into(),
            name: name.into(),
            charge,
        }
    }
}

/// Ranked shipping methods for a basket and candidate destination.
/// Pure computation — rates may depend on the owner, the contents and the
/// destination, but never on request state. The first method is treated as
/// the default; an empty list means the destination is not deliverable.
pub trait ShippingResolver: Send + Sync {
    fn methods_for(
        &self,
        owner: Option<Uuid>,
        basket: &Basket,
        destination: Option<&Address>,
    ) -> Vec<ShippingMethod>;
}
