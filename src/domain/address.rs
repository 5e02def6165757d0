use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 3166-1 alpha-2 code. Empty when the gateway sent something unusable —
/// the shipping callback degrades rather than rejecting the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(raw.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Degraded parse: anything unrecognisable becomes the empty country.
    pub fn or_empty(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_else(Self::empty)
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postal address as exchanged with the gateway. Everything but the country
/// is free-form; the gateway sends whatever the buyer typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: CountryCode,
}

impl Default for CountryCode {
    fn default() -> Self {
        Self::empty()
    }
}
