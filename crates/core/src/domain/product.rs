use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// A catalog product quoted in two parallel price bases. The foreign base is
/// optional; when absent it falls back to the local base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit: String,
    pub price_local: Decimal,
    pub price_foreign: Option<Decimal>,
}

impl Product {
    pub fn price_foreign_or_local(&self) -> Decimal {
        self.price_foreign.unwrap_or(self.price_local)
    }
}
