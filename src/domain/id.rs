use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::CheckoutError;

/// Gateway-issued session identifier for one checkout attempt (`EC-…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Result<Self, CheckoutError> {
        let token = token.into();
        if token.is_empty() {
            return Err(CheckoutError::Validation("token must not be empty".into()));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Gateway-issued buyer identifier, returned with the success redirect.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerId(String);

impl PayerId {
    pub fn new(id: impl Into<String>) -> Result<Self, CheckoutError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CheckoutError::Validation(
                "payer id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Merchant-side order number, assigned at order placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new(number: impl Into<String>) -> Result<Self, CheckoutError> {
        let number = number.into();
        if number.is_empty() {
            return Err(CheckoutError::Validation(
                "order number must not be empty".into(),
            ));
        }
        Ok(Self(number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
