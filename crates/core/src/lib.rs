//! Core domain for Marea: conversational order intake, mutable priced
//! budgets, and the per-customer balance ledger.
//!
//! Pricing, editing, and balance arithmetic are pure functions over explicit
//! inputs; catalog snapshots and exchange rates arrive as parameters, never
//! as ambient globals. I/O lives behind the repository and provider traits
//! implemented in `marea-db`.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod edit;
pub mod errors;
pub mod ledger;
pub mod matching;
pub mod resolver;

pub use catalog::{CatalogError, CatalogProvider, CatalogSnapshot};
pub use domain::budget::{Budget, BudgetId, BudgetLine, BudgetStatus, PricingMode};
pub use domain::customer::{Customer, CustomerId};
pub use domain::ledger::{
    CurrencyBucket, LedgerTransaction, LedgerTransactionId, TransactionKind,
};
pub use domain::product::{Product, ProductId};
pub use edit::{apply_edit, EditCommand, EditOutcome};
pub use errors::{EditError, OrderResolutionError};
pub use matching::{resolve_customer, CustomerMatch, CustomerSuggestion};
pub use resolver::{resolve_order, ParsedOrder, ParsedOrderItem, Resolution};
