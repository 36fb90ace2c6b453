use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use marea_core::catalog::{CatalogError, CatalogProvider, CatalogSnapshot};
use marea_core::domain::budget::{Budget, BudgetId};
use marea_core::domain::customer::{Customer, CustomerId};
use marea_core::domain::ledger::{LedgerTransaction, LedgerTransactionId};

use super::{BudgetRepository, CustomerRepository, LedgerRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryBudgetRepository {
    budgets: RwLock<HashMap<String, Budget>>,
}

#[async_trait]
impl BudgetRepository for InMemoryBudgetRepository {
    async fn find_by_id(&self, id: &BudgetId) -> Result<Option<Budget>, RepositoryError> {
        let budgets = self.budgets.read().await;
        Ok(budgets.get(&id.0).cloned())
    }

    async fn save(&self, budget: Budget) -> Result<(), RepositoryError> {
        let mut budgets = self.budgets.write().await;
        budgets.insert(budget.id.0.clone(), budget);
        Ok(())
    }

    async fn delete(&self, id: &BudgetId) -> Result<(), RepositoryError> {
        let mut budgets = self.budgets.write().await;
        budgets.remove(&id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<Vec<Customer>>,
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| &customer.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        let needle = name.trim().to_lowercase();
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| customer.name.to_lowercase() == needle).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().filter(|customer| customer.active).cloned().collect())
    }

    async fn save(&self, customer: Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|existing| existing.id == customer.id) {
            Some(existing) => *existing = customer,
            None => customers.push(customer),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLedgerRepository {
    transactions: RwLock<Vec<LedgerTransaction>>,
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn find_by_id(
        &self,
        id: &LedgerTransactionId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().find(|transaction| &transaction.id == id).cloned())
    }

    async fn find_by_budget_id(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .find(|transaction| transaction.linked_budget_id.as_ref() == Some(budget_id))
            .cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LedgerTransaction>, RepositoryError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|transaction| &transaction.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn save(&self, transaction: LedgerTransaction) -> Result<(), RepositoryError> {
        let mut transactions = self.transactions.write().await;
        match transactions.iter_mut().find(|existing| existing.id == transaction.id) {
            Some(existing) => *existing = transaction,
            None => transactions.push(transaction),
        }
        Ok(())
    }
}

/// Fixed snapshot provider for tests and offline runs.
pub struct InMemoryCatalogProvider {
    snapshot: CatalogSnapshot,
}

impl InMemoryCatalogProvider {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalogProvider {
    async fn get_catalog(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(self.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use marea_core::domain::budget::{Budget, BudgetId, PricingMode};
    use marea_core::domain::customer::{Customer, CustomerId};
    use marea_core::domain::ledger::{
        CurrencyBucket, LedgerTransaction, LedgerTransactionId, TransactionKind,
    };

    use crate::repositories::{
        BudgetRepository, InMemoryBudgetRepository, InMemoryLedgerRepository, LedgerRepository,
    };

    #[tokio::test]
    async fn budget_repo_round_trip_and_delete() {
        let repo = InMemoryBudgetRepository::default();
        let budget = Budget::new(
            BudgetId("B-mem-1".to_string()),
            NaiveDate::from_ymd_opt(2025, 1, 20).expect("date"),
            PricingMode::Local,
        );

        repo.save(budget.clone()).await.expect("save");
        assert_eq!(repo.find_by_id(&budget.id).await.expect("find"), Some(budget.clone()));

        repo.delete(&budget.id).await.expect("delete");
        assert_eq!(repo.find_by_id(&budget.id).await.expect("find"), None);
    }

    #[tokio::test]
    async fn ledger_repo_finds_rows_by_budget_link() {
        let repo = InMemoryLedgerRepository::default();
        let budget_id = BudgetId("B-mem-2".to_string());
        let transaction = LedgerTransaction {
            id: LedgerTransactionId("T-1".to_string()),
            customer_id: CustomerId(Uuid::new_v4()),
            kind: TransactionKind::Purchase,
            date: NaiveDate::from_ymd_opt(2025, 1, 21).expect("date"),
            amount_local: Decimal::from(10),
            amount_foreign: None,
            bucket: CurrencyBucket::Local,
            linked_budget_id: Some(budget_id.clone()),
            is_paid: false,
            paid_method: None,
            paid_date: None,
        };

        repo.save(transaction.clone()).await.expect("save");
        let found = repo.find_by_budget_id(&budget_id).await.expect("find");
        assert_eq!(found, Some(transaction));
    }

    #[tokio::test]
    async fn customer_repo_save_updates_existing_entry() {
        use crate::repositories::{CustomerRepository, InMemoryCustomerRepository};

        let repo = InMemoryCustomerRepository::default();
        let mut customer = Customer {
            id: CustomerId(Uuid::new_v4()),
            name: "Maria".to_string(),
            address: None,
            active: true,
        };
        repo.save(customer.clone()).await.expect("save");

        customer.address = Some("Calle 5".to_string());
        repo.save(customer.clone()).await.expect("update");

        let listed = repo.list_active().await.expect("list");
        assert_eq!(listed, vec![customer]);
    }
}
