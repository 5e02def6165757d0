//! In-memory reference stores. The surrounding shop owns real basket and
//! order persistence; these back the integration tests and the demo wiring
//! in `main`.

use {
    crate::domain::{
        basket::{Basket, BasketStatus},
        error::StoreError,
        id::{OrderNumber, Token},
        order::{Order, OrderStatus, OrderSubmission, PaymentEvent, PaymentSource},
        stores::{BasketStore, OrderStore, TransactionLedger},
        transaction::{PreAuthSnapshot, TransactionRecord},
    },
    async_trait::async_trait,
    std::collections::HashMap,
    std::sync::atomic::{AtomicU64, Ordering},
    tokio::sync::Mutex,
    uuid::Uuid,
};

#[derive(Default)]
pub struct MemoryBasketStore {
    baskets: Mutex<HashMap<Uuid, Basket>>,
}

impl MemoryBasketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, basket: Basket) {
        self.baskets.lock().await.insert(basket.id(), basket);
    }

    pub async fn status(&self, id: Uuid) -> Option<BasketStatus> {
        self.baskets.lock().await.get(&id).map(Basket::status)
    }
}

#[async_trait]
impl BasketStore for MemoryBasketStore {
    async fn get(&self, id: Uuid) -> Result<Option<Basket>, StoreError> {
        Ok(self.baskets.lock().await.get(&id).cloned())
    }

    async fn load_frozen(&self, id: Uuid) -> Result<Option<Basket>, StoreError> {
        Ok(self
            .baskets
            .lock()
            .await
            .get(&id)
            .filter(|basket| basket.status() == BasketStatus::Frozen)
            .cloned())
    }

    async fn freeze(&self, id: Uuid) -> Result<(), StoreError> {
        match self.baskets.lock().await.get_mut(&id) {
            Some(basket) => {
                basket.freeze();
                Ok(())
            }
            None => Err(StoreError::Other(format!("basket {id} not found"))),
        }
    }

    async fn thaw(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(basket) = self.baskets.lock().await.get_mut(&id) {
            basket.thaw();
        }
        Ok(())
    }
}

/// Sources and events captured for an order at `save_payment_details` time.
#[derive(Debug, Clone, Default)]
pub struct PaymentDetails {
    pub sources: Vec<PaymentSource>,
    pub events: Vec<PaymentEvent>,
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<OrderNumber, Order>>,
    submissions: Mutex<Vec<OrderSubmission>>,
    sources: Mutex<Vec<PaymentSource>>,
    events: Mutex<Vec<PaymentEvent>>,
    saved_details: Mutex<HashMap<OrderNumber, PaymentDetails>>,
    sequence: AtomicU64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        self.orders.lock().await.insert(order.number().clone(), order);
    }

    pub async fn events_for(&self, number: &OrderNumber) -> Vec<PaymentEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|event| &event.order == number)
            .cloned()
            .collect()
    }

    pub async fn sources_for(&self, number: &OrderNumber) -> Vec<PaymentSource> {
        self.sources
            .lock()
            .await
            .iter()
            .filter(|source| &source.order == number)
            .cloned()
            .collect()
    }

    pub async fn saved_details_for(&self, number: &OrderNumber) -> Option<PaymentDetails> {
        self.saved_details.lock().await.get(number).cloned()
    }

    pub async fn submissions(&self) -> Vec<OrderSubmission> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_basket(&self, basket_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .await
            .values()
            .find(|order| order.basket_id() == basket_id)
            .cloned())
    }

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.lock().await.get(number).cloned())
    }

    async fn place(&self, submission: OrderSubmission) -> Result<Order, StoreError> {
        let sequence = 100000 + self.sequence.fetch_add(1, Ordering::SeqCst);
        let number = OrderNumber::new(sequence.to_string())
            .map_err(|err| StoreError::Other(err.to_string()))?;
        let order = Order::new(
            number.clone(),
            submission.basket_id,
            submission.total,
            submission.guest_email.clone(),
        );
        self.orders.lock().await.insert(number, order.clone());
        self.submissions.lock().await.push(submission);
        Ok(order)
    }

    async fn set_status(
        &self,
        number: &OrderNumber,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        match self.orders.lock().await.get_mut(number) {
            Some(order) => {
                order.set_status(status);
                Ok(())
            }
            None => Err(StoreError::Other(format!("order {number} not found"))),
        }
    }

    async fn add_payment_source(&self, source: PaymentSource) -> Result<(), StoreError> {
        self.sources.lock().await.push(source);
        Ok(())
    }

    async fn add_payment_event(&self, event: PaymentEvent) -> Result<(), StoreError> {
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn save_payment_details(&self, number: &OrderNumber) -> Result<(), StoreError> {
        let sources = self.sources_for(number).await;
        let events = self.events_for(number).await;
        self.saved_details
            .lock()
            .await
            .insert(number.clone(), PaymentDetails { sources, events });
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<TransactionRecord>>,
    snapshots: Mutex<HashMap<String, PreAuthSnapshot>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<TransactionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.lock().await.len()
    }
}

#[async_trait]
impl TransactionLedger for MemoryLedger {
    async fn record(&self, record: TransactionRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn store_snapshot(&self, snapshot: PreAuthSnapshot) -> Result<(), StoreError> {
        self.snapshots
            .lock()
            .await
            .insert(snapshot.token().as_str().to_string(), snapshot);
        Ok(())
    }

    async fn find_snapshot(&self, token: &Token) -> Result<Option<PreAuthSnapshot>, StoreError> {
        Ok(self.snapshots.lock().await.get(token.as_str()).cloned())
    }
}
