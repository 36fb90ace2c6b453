use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_PRODUCT_IDS: &[&str] = &[
    "p-camaron",
    "p-camaron-titi",
    "p-calamar",
    "p-pulpo",
    "p-mejillon",
    "p-pescado-sierra",
    "p-langosta",
    "p-pepitona",
];

const SEED_CUSTOMER_NAMES: &[&str] =
    &["Delcy Rodriguez", "María Pérez", "Restaurante El Muelle", "Jose Antiguo"];

/// Demo dataset used by `marea seed` and the end-to-end tests: a small
/// seafood catalog, the exchange rate setting, and a few customers.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the demo dataset into the database. Re-running is safe: every
    /// statement upserts on its natural key.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            products_seeded: SEED_PRODUCT_IDS.len(),
            customers_seeded: SEED_CUSTOMER_NAMES.len(),
        })
    }

    /// Verify that the demo dataset is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product_id in SEED_PRODUCT_IDS {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1)")
                    .bind(product_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((*product_id, exists == 1));
        }

        for name in SEED_CUSTOMER_NAMES {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE name = ?1)")
                    .bind(name)
                    .fetch_one(pool)
                    .await?;
            checks.push((*name, exists == 1));
        }

        let rate_exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM app_settings WHERE key = 'exchange_rate')",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("exchange_rate", rate_exists == 1));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }
}

pub struct SeedResult {
    pub products_seeded: usize,
    pub customers_seeded: usize,
}

pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
