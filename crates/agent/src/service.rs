//! Order intake orchestration: free text in, persisted budgets and ledger
//! rows out. Every operation is a sequential read-modify-write; concurrent
//! edits of the same budget are last-writer-wins.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use marea_core::catalog::{CatalogError, CatalogProvider};
use marea_core::domain::budget::{Budget, BudgetId, PricingMode};
use marea_core::domain::customer::{Customer, CustomerId};
use marea_core::domain::ledger::{CurrencyBucket, LedgerTransaction};
use marea_core::edit::{apply_edit, EditCommand, EditOutcome};
use marea_core::errors::{EditError, OrderResolutionError};
use marea_core::ledger::{balance, payment, purchase_from_budget, sync_with_budget};
use marea_core::matching::{resolve_customer, CustomerMatch, CustomerSuggestion};
use marea_core::resolver::{resolve_order, ParsedOrder};
use marea_db::repositories::{
    BudgetRepository, CustomerRepository, LedgerRepository, RepositoryError,
};

use crate::llm::LlmClient;
use crate::parse::{decode_order, order_prompt, ParseError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("budget `{0}` not found")]
    BudgetNotFound(String),
    #[error("customer `{0}` not found")]
    CustomerNotFound(String),
    #[error("budget `{budget_id}` is already linked to transaction `{transaction_id}`")]
    AlreadyLinked { budget_id: String, transaction_id: String },
    #[error("budget `{0}` is linked to the ledger and cannot be deleted")]
    BudgetLinked(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolution(#[from] OrderResolutionError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("language model request failed: {0}")]
    Llm(#[from] anyhow::Error),
}

/// Result of creating a budget from one free-text message.
#[derive(Clone, Debug)]
pub struct OrderOutcome {
    pub budget: Budget,
    /// Mentions that resolved to nothing; reported, never silently priced.
    pub unmatched: Vec<String>,
    /// Present when the parse named a customer and the link went through.
    pub linked: Option<LedgerTransaction>,
    /// Present when the parse named a customer nobody matched confidently.
    pub customer_suggestions: Vec<CustomerSuggestion>,
}

#[derive(Clone, Debug)]
pub enum LinkOutcome {
    Linked(LedgerTransaction),
    /// No confident match; the budget stays unlinked.
    Suggestions(Vec<CustomerSuggestion>),
}

pub struct OrderService<L: LlmClient> {
    llm: L,
    catalog: Arc<dyn CatalogProvider>,
    budgets: Arc<dyn BudgetRepository>,
    customers: Arc<dyn CustomerRepository>,
    ledger: Arc<dyn LedgerRepository>,
    max_retries: u32,
}

impl<L: LlmClient> OrderService<L> {
    pub fn new(
        llm: L,
        catalog: Arc<dyn CatalogProvider>,
        budgets: Arc<dyn BudgetRepository>,
        customers: Arc<dyn CustomerRepository>,
        ledger: Arc<dyn LedgerRepository>,
        max_retries: u32,
    ) -> Self {
        Self { llm, catalog, budgets, customers, ledger, max_retries }
    }

    /// Turn one colloquial order message into a persisted budget. When the
    /// parse names a known customer the budget is linked in a second,
    /// idempotent step; a crash between the two writes leaves an unlinked
    /// budget that a retried link recovers.
    pub async fn create_order_from_text(
        &self,
        text: &str,
        mode: PricingMode,
        date: NaiveDate,
    ) -> Result<OrderOutcome, ServiceError> {
        let catalog = self.catalog.get_catalog().await?;
        let directory = self.customers.list_active().await?;
        let customer_names: Vec<String> =
            directory.iter().map(|customer| customer.name.clone()).collect();

        let prompt = order_prompt(text, &catalog, &customer_names);
        let parsed = self.parse_with_retries(&prompt).await?;

        let mode = effective_mode(&parsed, mode);
        let resolution = resolve_order(&parsed.items, &catalog, mode)?;

        let mut budget = Budget::new(
            BudgetId(format!("B-{}", Uuid::new_v4())),
            parsed.explicit_date.unwrap_or(date),
            mode,
        );
        budget.lines = resolution.lines;
        budget.delivery_fee = parsed.delivery_fee.unwrap_or(Decimal::ZERO);
        budget.customer_name = parsed.customer_name.clone();
        budget.customer_address = parsed.customer_address.clone();
        budget.recompute_totals();
        if parsed.mark_paid == Some(true) {
            budget.mark_paid();
        }

        let mut unmatched = resolution.unmatched;
        unmatched.extend(parsed.unmatched_texts.iter().cloned());

        self.budgets.save(budget.clone()).await?;
        tracing::info!(
            budget_id = %budget.id.0,
            lines = budget.lines.len(),
            total_local = %budget.total_local,
            "budget created"
        );

        let mut linked = None;
        let mut customer_suggestions = Vec::new();
        if let Some(name) = &parsed.customer_name {
            match self.link_to_customer(&budget.id, name).await? {
                LinkOutcome::Linked(transaction) => linked = Some(transaction),
                LinkOutcome::Suggestions(suggestions) => customer_suggestions = suggestions,
            }
        }

        Ok(OrderOutcome { budget, unmatched, linked, customer_suggestions })
    }

    /// Apply one named edit command, persist the result, and re-mirror any
    /// linked ledger row.
    pub async fn apply_edit(
        &self,
        budget_id: &BudgetId,
        command: EditCommand,
    ) -> Result<EditOutcome, ServiceError> {
        let budget = self.require_budget(budget_id).await?;
        let catalog = self.catalog.get_catalog().await?;

        let outcome = apply_edit(&budget, command, &catalog)?;
        self.budgets.save(outcome.budget.clone()).await?;
        self.resync_linked(&outcome.budget).await?;

        tracing::info!(budget_id = %budget_id.0, summary = %outcome.summary, "budget edited");
        Ok(outcome)
    }

    /// Link a budget into a customer's ledger. At most one transaction ever
    /// references a budget; a repeated link reports `AlreadyLinked` instead
    /// of writing a duplicate.
    pub async fn link_to_customer(
        &self,
        budget_id: &BudgetId,
        name_or_id: &str,
    ) -> Result<LinkOutcome, ServiceError> {
        let budget = self.require_budget(budget_id).await?;

        if let Some(existing) = self.ledger.find_by_budget_id(budget_id).await? {
            return Err(ServiceError::AlreadyLinked {
                budget_id: budget_id.0.clone(),
                transaction_id: existing.id.0,
            });
        }

        let customer = match self.find_customer(name_or_id).await? {
            CustomerMatch::Resolved(customer) => customer,
            CustomerMatch::Suggestions(suggestions) => {
                tracing::info!(
                    budget_id = %budget_id.0,
                    query = name_or_id,
                    count = suggestions.len(),
                    "no confident customer match"
                );
                return Ok(LinkOutcome::Suggestions(suggestions));
            }
        };

        let transaction = purchase_from_budget(&budget, customer.id);
        self.ledger.save(transaction.clone()).await?;
        tracing::info!(
            budget_id = %budget_id.0,
            customer = %customer.name,
            transaction_id = %transaction.id.0,
            "budget linked"
        );
        Ok(LinkOutcome::Linked(transaction))
    }

    pub async fn get_budget(&self, budget_id: &BudgetId) -> Result<Budget, ServiceError> {
        self.require_budget(budget_id).await
    }

    /// Delete a budget. Refused once it is linked; the ledger row is the
    /// durable record and must not be orphaned.
    pub async fn delete_budget(&self, budget_id: &BudgetId) -> Result<(), ServiceError> {
        let _ = self.require_budget(budget_id).await?;
        if self.ledger.find_by_budget_id(budget_id).await?.is_some() {
            return Err(ServiceError::BudgetLinked(budget_id.0.clone()));
        }
        self.budgets.delete(budget_id).await?;
        Ok(())
    }

    /// Mark a budget paid, recording method and date on the linked ledger
    /// row when there is one.
    pub async fn mark_paid(
        &self,
        budget_id: &BudgetId,
        method: Option<String>,
        date: NaiveDate,
    ) -> Result<Budget, ServiceError> {
        let mut budget = self.require_budget(budget_id).await?;
        budget.mark_paid();
        self.budgets.save(budget.clone()).await?;

        if let Some(mut transaction) = self.ledger.find_by_budget_id(budget_id).await? {
            sync_with_budget(&mut transaction, &budget);
            transaction.paid_method = method;
            transaction.paid_date = Some(date);
            self.ledger.save(transaction).await?;
        }
        Ok(budget)
    }

    /// The explicit reverse of `mark_paid`; the linked row's settlement
    /// fields are cleared.
    pub async fn mark_unpaid(&self, budget_id: &BudgetId) -> Result<Budget, ServiceError> {
        let mut budget = self.require_budget(budget_id).await?;
        budget.mark_unpaid();
        self.budgets.save(budget.clone()).await?;
        self.resync_linked(&budget).await?;
        Ok(budget)
    }

    /// Record a standalone payment against a customer's balance.
    pub async fn record_payment(
        &self,
        customer_id: &CustomerId,
        date: NaiveDate,
        amount: Decimal,
        bucket: CurrencyBucket,
    ) -> Result<LedgerTransaction, ServiceError> {
        let customer = self
            .customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| ServiceError::CustomerNotFound(customer_id.0.to_string()))?;

        let transaction = payment(customer.id, date, amount, bucket);
        self.ledger.save(transaction.clone()).await?;
        tracing::info!(
            customer_id = %customer_id.0,
            amount = %amount,
            "payment recorded"
        );
        Ok(transaction)
    }

    /// Outstanding balance in one currency bucket, recomputed from the
    /// transaction list on every call.
    pub async fn balance(
        &self,
        customer_id: &CustomerId,
        bucket: CurrencyBucket,
    ) -> Result<Decimal, ServiceError> {
        let transactions = self.ledger.list_for_customer(customer_id).await?;
        Ok(balance(&transactions, bucket))
    }

    async fn parse_with_retries(&self, prompt: &str) -> Result<ParsedOrder, ServiceError> {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let reply = match self.llm.complete(prompt).await {
                Ok(reply) => reply,
                Err(error) => {
                    tracing::warn!(attempt, %error, "language model request failed");
                    last_error = Some(ServiceError::Llm(error));
                    continue;
                }
            };
            match decode_order(&reply) {
                Ok(parsed) => return Ok(parsed),
                Err(error) => {
                    tracing::warn!(attempt, %error, "order parse failed");
                    last_error = Some(ServiceError::Parse(error));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ServiceError::Parse(ParseError::Malformed { detail: "no attempts made".to_string() })
        }))
    }

    async fn require_budget(&self, budget_id: &BudgetId) -> Result<Budget, ServiceError> {
        self.budgets
            .find_by_id(budget_id)
            .await?
            .ok_or_else(|| ServiceError::BudgetNotFound(budget_id.0.clone()))
    }

    async fn resync_linked(&self, budget: &Budget) -> Result<(), ServiceError> {
        if let Some(mut transaction) = self.ledger.find_by_budget_id(&budget.id).await? {
            sync_with_budget(&mut transaction, budget);
            self.ledger.save(transaction).await?;
        }
        Ok(())
    }

    async fn find_customer(&self, name_or_id: &str) -> Result<CustomerMatch, ServiceError> {
        if let Ok(id) = Uuid::from_str(name_or_id) {
            if let Some(customer) = self.customers.find_by_id(&CustomerId(id)).await? {
                return Ok(CustomerMatch::Resolved(customer));
            }
        }
        let directory: Vec<Customer> = self.customers.list_active().await?;
        Ok(resolve_customer(name_or_id, &directory))
    }
}

fn effective_mode(parsed: &ParsedOrder, requested: PricingMode) -> PricingMode {
    if let Some(mode) = parsed.pricing_mode {
        return mode;
    }
    if parsed.settle_in_foreign_currency == Some(true) {
        return PricingMode::Foreign;
    }
    requested
}
