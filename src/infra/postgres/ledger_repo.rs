use {
    crate::domain::{
        error::StoreError,
        id::Token,
        stores::TransactionLedger,
        transaction::{PreAuthSnapshot, TransactionRecord},
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{PgPool, Row},
    uuid::Uuid,
};

/// Postgres-backed transaction ledger: append-only gateway exchanges plus
/// write-once pre-authorization snapshots keyed by token.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLedger for PgLedger {
    async fn record(&self, record: TransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO express_transactions
                (id, method, version, amount, currency, ack, correlation_id, token,
                 error_code, error_message, raw_request, raw_response, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id())
        .bind(record.method().as_str())
        .bind(record.version())
        .bind(record.amount().map(|money| money.amount().value()))
        .bind(record.amount().map(|money| money.currency().as_str()))
        .bind(record.ack().as_str())
        .bind(record.correlation_id())
        .bind(record.token())
        .bind(record.error_code())
        .bind(record.error_message())
        .bind(record.raw_request())
        .bind(record.raw_response())
        .bind(record.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_snapshot(&self, snapshot: PreAuthSnapshot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO express_pre_auth
                (token, email, billing_address, shipping_address, cart,
                 customer_id, basket_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(snapshot.token().as_str())
        .bind(snapshot.email())
        .bind(snapshot.billing_address_json().cloned())
        .bind(snapshot.shipping_address_json().cloned())
        .bind(snapshot.cart().cloned())
        .bind(snapshot.customer())
        .bind(snapshot.basket())
        .bind(snapshot.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_snapshot(&self, token: &Token) -> Result<Option<PreAuthSnapshot>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT email, billing_address, shipping_address, cart,
                   customer_id, basket_id, created_at
            FROM express_pre_auth
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(PreAuthSnapshot::from_parts(
            token.clone(),
            row.try_get::<Option<String>, _>("email")?,
            row.try_get::<Option<serde_json::Value>, _>("billing_address")?,
            row.try_get::<Option<serde_json::Value>, _>("shipping_address")?,
            row.try_get::<Option<serde_json::Value>, _>("cart")?,
            row.try_get::<Option<Uuid>, _>("customer_id")?,
            row.try_get::<Option<Uuid>, _>("basket_id")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        )))
    }
}
