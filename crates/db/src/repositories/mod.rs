use async_trait::async_trait;
use thiserror::Error;

use marea_core::domain::budget::{Budget, BudgetId};
use marea_core::domain::customer::{Customer, CustomerId};
use marea_core::domain::ledger::{LedgerTransaction, LedgerTransactionId};

pub mod budget;
pub mod customer;
pub mod ledger;
pub mod memory;

pub use budget::SqlBudgetRepository;
pub use customer::SqlCustomerRepository;
pub use ledger::SqlLedgerRepository;
pub use memory::{
    InMemoryBudgetRepository, InMemoryCatalogProvider, InMemoryCustomerRepository,
    InMemoryLedgerRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait BudgetRepository: Send + Sync {
    async fn find_by_id(&self, id: &BudgetId) -> Result<Option<Budget>, RepositoryError>;
    async fn save(&self, budget: Budget) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &BudgetId) -> Result<(), RepositoryError>;
}

/// The customer directory: exact lookup plus the active listing the fuzzy
/// matcher works against.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Customer>, RepositoryError>;
    async fn save(&self, customer: Customer) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &LedgerTransactionId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError>;

    /// The idempotency probe for linking: at most one transaction may
    /// reference a budget.
    async fn find_by_budget_id(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError>;

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LedgerTransaction>, RepositoryError>;

    async fn save(&self, transaction: LedgerTransaction) -> Result<(), RepositoryError>;
}
