pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::domain::{shipping::ShippingResolver, stores::BasketStore};
use crate::services::checkout::CheckoutOrchestrator;

/// Shared state for the HTTP entry points. The basket store and shipping
/// resolver also sit inside the orchestrator; the shipping callback talks
/// to them directly because it is not part of the buyer's state machine.
#[derive(Clone)]
pub struct AppState {
    pub checkout: Arc<CheckoutOrchestrator>,
    pub baskets: Arc<dyn BasketStore>,
    pub shipping: Arc<dyn ShippingResolver>,
}
