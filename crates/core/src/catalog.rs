use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{Product, ProductId};

/// A point-in-time view of the catalog plus the active exchange rate, fetched
/// fresh per operation. The rate rides along for display purposes; pricing
/// arithmetic works off the two price bases each product already carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub exchange_rate: Decimal,
}

impl CatalogSnapshot {
    pub fn new(products: Vec<Product>, exchange_rate: Decimal) -> Self {
        Self { products, exchange_rate }
    }

    pub fn find_by_id(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    /// Name lookup in the documented priority order: exact match first, then
    /// bidirectional substring. Comparison is case- and accent-insensitive;
    /// colloquial order text rarely carries the accents the catalog does.
    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        let needle = crate::matching::normalize(name);
        if needle.is_empty() {
            return None;
        }

        self.products
            .iter()
            .find(|product| crate::matching::normalize(&product.name) == needle)
            .or_else(|| {
                self.products.iter().find(|product| {
                    let candidate = crate::matching::normalize(&product.name);
                    candidate.contains(&needle) || needle.contains(&candidate)
                })
            })
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator boundary for the live catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn get_catalog(&self) -> Result<CatalogSnapshot, CatalogError>;
}
