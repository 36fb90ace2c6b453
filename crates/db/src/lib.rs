//! SQLite persistence for marea: pooled connections, embedded migrations,
//! repository traits with SQL and in-memory implementations, and the demo
//! seed dataset.

pub mod catalog;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use catalog::SqlCatalogProvider;
pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{DemoSeedDataset, SeedResult, VerificationResult};
