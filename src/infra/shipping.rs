use {
    crate::domain::{
        address::{Address, CountryCode},
        basket::Basket,
        shipping::{ShippingMethod, ShippingResolver},
    },
    uuid::Uuid,
};

/// Reference resolver: a fixed table of methods, ranked as configured,
/// with an optional deliverable-country allowlist. Real shops plug in
/// their own rate engine behind the same trait.
pub struct StaticShippingTable {
    methods: Vec<ShippingMethod>,
    countries: Option<Vec<CountryCode>>,
}

impl StaticShippingTable {
    pub fn new(methods: Vec<ShippingMethod>) -> Self {
        Self {
            methods,
            countries: None,
        }
    }

    pub fn with_countries(methods: Vec<ShippingMethod>, countries: Vec<CountryCode>) -> Self {
        Self {
            methods,
            countries: Some(countries),
        }
    }
}

impl ShippingResolver for StaticShippingTable {
    fn methods_for(
        &self,
        _owner: Option<Uuid>,
        _basket: &Basket,
        destination: Option<&Address>,
    ) -> Vec<ShippingMethod> {
        if let (Some(allowed), Some(address)) = (&self.countries, destination) {
            if !allowed.contains(&address.country) {
                return Vec::new();
            }
        }
        self.methods.clone()
    }
}
