use {
    super::address::Address, super::shipping::ShippingMethod, serde::Deserialize,
    serde::Serialize, uuid::Uuid,
};

/// Immutable view of the buyer's checkout session, threaded through the
/// phase functions as a parameter. The orchestrator never stashes request
/// state on itself; everything a phase needs arrives here or in the
/// pre-authorization snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub customer: Option<Uuid>,
    pub email: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub shipping_method: Option<ShippingMethod>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }
}
