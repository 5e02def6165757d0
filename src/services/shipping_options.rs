use {
    crate::domain::{
        address::{Address, CountryCode},
        shipping::{ShippingMethod, ShippingResolver},
        stores::BasketStore,
    },
    uuid::Uuid,
};

/// Provisional destination the gateway posts while the buyer is picking an
/// address on its UI. Every field is whatever the buyer typed so far.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub country: Option<String>,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub currency_code: Option<String>,
}

impl CallbackRequest {
    /// A best-effort address. An unusable country code degrades to empty
    /// rather than failing — the gateway must always get a response.
    pub fn provisional_address(&self) -> Address {
        Address {
            name: None,
            line1: self.street.clone(),
            line2: self.street2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postcode: self.postcode.clone(),
            country: CountryCode::or_empty(self.country.as_deref()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShippingOptionsReply {
    pub currency_code: String,
    /// Resolver order; the first method is the default. Empty means the
    /// destination is not deliverable.
    pub methods: Vec<ShippingMethod>,
}

/// Resolve shipping options for the gateway's mid-session callback.
///
/// `None` means the basket does not exist (the transport answers 404).
/// Anything else — including a store outage — yields a reply, because the
/// gateway's checkout UI hangs on this answer and must never see an error.
pub async fn shipping_options(
    baskets: &dyn BasketStore,
    resolver: &dyn ShippingResolver,
    basket_id: Uuid,
    request: &CallbackRequest,
) -> Option<ShippingOptionsReply> {
    let currency_code = request
        .currency_code
        .clone()
        .unwrap_or_else(|| "GBP".to_string());

    let basket = match baskets.get(basket_id).await {
        Ok(Some(basket)) => basket,
        Ok(None) => return None,
        Err(err) => {
            tracing::error!(%basket_id, error = %err, "basket store unavailable during shipping callback");
            return Some(ShippingOptionsReply {
                currency_code,
                methods: Vec::new(),
            });
        }
    };

    let destination = request.provisional_address();
    let methods = resolver.methods_for(basket.owner(), &basket, Some(&destination));
    tracing::info!(
        %basket_id,
        country = destination.country.as_str(),
        count = methods.len(),
        "shipping options resolved for gateway callback"
    );
    Some(ShippingOptionsReply {
        currency_code,
        methods,
    })
}
