use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use marea_core::catalog::{CatalogError, CatalogProvider, CatalogSnapshot};
use marea_core::domain::product::{Product, ProductId};

use crate::DbPool;

/// Catalog provider backed by the `product` table, with the exchange rate
/// read from `app_settings` under the `exchange_rate` key.
pub struct SqlCatalogProvider {
    pool: DbPool,
}

impl SqlCatalogProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogProvider for SqlCatalogProvider {
    async fn get_catalog(&self) -> Result<CatalogSnapshot, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, name, unit, price_local, price_foreign FROM product ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| CatalogError::Unavailable(error.to_string()))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String =
                row.try_get("id").map_err(|error| CatalogError::Unavailable(error.to_string()))?;
            let name: String = row
                .try_get("name")
                .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
            let unit: String = row
                .try_get("unit")
                .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
            let price_local: String = row
                .try_get("price_local")
                .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
            let price_foreign: Option<String> = row
                .try_get("price_foreign")
                .map_err(|error| CatalogError::Unavailable(error.to_string()))?;

            products.push(Product {
                id: ProductId(id),
                name,
                unit,
                price_local: decode_price("price_local", &price_local)?,
                price_foreign: price_foreign
                    .map(|text| decode_price("price_foreign", &text))
                    .transpose()?,
            });
        }

        let rate: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = 'exchange_rate'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
        let exchange_rate = match rate {
            Some(text) => decode_price("exchange_rate", &text)?,
            None => Decimal::ZERO,
        };

        Ok(CatalogSnapshot::new(products, exchange_rate))
    }
}

fn decode_price(field: &str, text: &str) -> Result<Decimal, CatalogError> {
    Decimal::from_str(text).map_err(|error| {
        CatalogError::Unavailable(format!("invalid decimal in `{field}`: {error}"))
    })
}
