use {
    super::basket::Basket,
    super::error::StoreError,
    super::id::{OrderNumber, Token},
    super::order::{Order, OrderStatus, OrderSubmission, PaymentEvent, PaymentSource},
    super::transaction::{PreAuthSnapshot, TransactionRecord},
    async_trait::async_trait,
    uuid::Uuid,
};

/// Basket persistence owned by the surrounding shop. The orchestrator only
/// needs reads plus the freeze/thaw transitions bracketing the redirect.
#[async_trait]
pub trait BasketStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Basket>, StoreError>;

    /// The frozen basket for a returning buyer, with current pricing and
    /// promotions re-applied. `None` when no basket with that id is frozen.
    async fn load_frozen(&self, id: Uuid) -> Result<Option<Basket>, StoreError>;

    async fn freeze(&self, id: Uuid) -> Result<(), StoreError>;

    /// Return a basket to `Open`. Must be a no-op when the basket is not
    /// frozen (or gone) so repeated cancel callbacks never fail.
    async fn thaw(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Order persistence and placement owned by the surrounding shop.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_basket(&self, basket_id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, StoreError>;

    async fn place(&self, submission: OrderSubmission) -> Result<Order, StoreError>;

    async fn set_status(&self, number: &OrderNumber, status: OrderStatus)
    -> Result<(), StoreError>;

    async fn add_payment_source(&self, source: PaymentSource) -> Result<(), StoreError>;

    async fn add_payment_event(&self, event: PaymentEvent) -> Result<(), StoreError>;

    /// Persist the order's payment-details snapshot — sources and events
    /// recorded so far. Called in every capture branch, success or not,
    /// before the buyer is redirected.
    async fn save_payment_details(&self, number: &OrderNumber) -> Result<(), StoreError>;
}

/// Audit trail of gateway traffic plus the pre-authorization snapshots.
/// Records are append-only; snapshots are write-once, keyed by token.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn record(&self, record: TransactionRecord) -> Result<(), StoreError>;

    async fn store_snapshot(&self, snapshot: PreAuthSnapshot) -> Result<(), StoreError>;

    async fn find_snapshot(&self, token: &Token) -> Result<Option<PreAuthSnapshot>, StoreError>;
}
