use thiserror::Error;

/// Failure talking to the remote payment gateway.
///
/// `Declined` carries the gateway's own error code and correlation id so the
/// capture phase can tell an ambiguous decline apart from a terminal one.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport: {0}")]
    Transport(String),

    #[error("malformed gateway response: {0}")]
    Protocol(String),

    #[error("gateway declined [{code}]: {message}")]
    Declined {
        code: String,
        correlation_id: Option<String>,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store: {0}")]
    Other(String),
}

/// Everything that can go wrong inside a checkout phase.
///
/// All variants except `Store` are mapped to a redirect + message at the
/// phase boundary and never reach the buyer as an error response. `Store`
/// failures propagate to the host framework's generic error handling.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("basket is empty")]
    EmptyBasket,

    #[error("shipping address is missing")]
    MissingShippingAddress,

    #[error("shipping method is missing")]
    MissingShippingMethod,

    #[error("invalid basket: {0}")]
    InvalidBasket(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("basket not found")]
    BasketNotFound,

    #[error("shipping and billing countries differ")]
    CountryMismatch,

    #[error("terms of service not accepted")]
    TermsNotAccepted,

    #[error("required gateway parameters are missing")]
    MissingParameters,

    #[error("validation: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
