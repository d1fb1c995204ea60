//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a product.
///
/// Products are owned by the surrounding application's persistence layer; this
/// core never mints identities, it only echoes the ids it is handed. The
/// newtype keeps product ids from being confused with other strings (SKUs,
/// category names) at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<ProductId> for String {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::invalid_id("ProductId: cannot be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_round_trips_through_display() {
        let id = ProductId::new("prod-042");
        assert_eq!(id.to_string(), "prod-042");
        assert_eq!(id.as_str(), "prod-042");
    }

    #[test]
    fn product_id_from_str_rejects_blank() {
        let err = "   ".parse::<ProductId>().unwrap_err();
        match err {
            DomainError::InvalidId(_) => {}
            _ => panic!("Expected InvalidId error for blank id"),
        }
    }

    #[test]
    fn product_id_from_str_accepts_plain_strings() {
        let id: ProductId = "sku-9".parse().unwrap();
        assert_eq!(id, ProductId::new("sku-9"));
    }
}
