use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::budget::BudgetId;
use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerTransactionId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Payment,
}

/// The grouping key under which ledger balances are computed independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyBucket {
    Local,
    Foreign,
}

/// One row of a customer's running account. At most one transaction may
/// reference a given budget id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: LedgerTransactionId,
    pub customer_id: CustomerId,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub amount_local: Decimal,
    pub amount_foreign: Option<Decimal>,
    pub bucket: CurrencyBucket,
    pub linked_budget_id: Option<BudgetId>,
    pub is_paid: bool,
    pub paid_method: Option<String>,
    pub paid_date: Option<NaiveDate>,
}

impl LedgerTransaction {
    /// The amount this row contributes under a given bucket. A row in the
    /// Foreign bucket must carry an explicit foreign amount; the local amount
    /// is always recorded alongside it.
    pub fn amount_in_bucket(&self, bucket: CurrencyBucket) -> Decimal {
        if self.bucket != bucket {
            return Decimal::ZERO;
        }
        match bucket {
            CurrencyBucket::Local => self.amount_local,
            CurrencyBucket::Foreign => self.amount_foreign.unwrap_or(self.amount_local),
        }
    }
}
