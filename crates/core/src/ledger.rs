//! Pure ledger logic: mapping a budget into its ledger purchase row, payment
//! construction, and the read-time balance aggregate.
//!
//! Balances are recomputed from the transaction set on every read and never
//! cached, so they cannot drift. Per-customer volumes are small enough that
//! this stays cheap.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::budget::{Budget, PricingMode};
use crate::domain::customer::CustomerId;
use crate::domain::ledger::{
    CurrencyBucket, LedgerTransaction, LedgerTransactionId, TransactionKind,
};

/// The currency bucket a budget settles under. Dual budgets settle in the
/// local bucket with the foreign total recorded on the same row.
pub fn bucket_for_mode(mode: PricingMode) -> CurrencyBucket {
    match mode {
        PricingMode::Foreign => CurrencyBucket::Foreign,
        PricingMode::Local | PricingMode::Dual => CurrencyBucket::Local,
    }
}

/// Build the single purchase transaction for a budget. Paid status mirrors
/// the budget's status at link time.
pub fn purchase_from_budget(budget: &Budget, customer_id: CustomerId) -> LedgerTransaction {
    LedgerTransaction {
        id: LedgerTransactionId(Uuid::new_v4().to_string()),
        customer_id,
        kind: TransactionKind::Purchase,
        date: budget.date,
        amount_local: budget.total_local,
        amount_foreign: budget.total_foreign,
        bucket: bucket_for_mode(budget.pricing_mode),
        linked_budget_id: Some(budget.id.clone()),
        is_paid: budget.is_paid(),
        paid_method: None,
        paid_date: None,
    }
}

pub fn payment(
    customer_id: CustomerId,
    date: NaiveDate,
    amount: Decimal,
    bucket: CurrencyBucket,
) -> LedgerTransaction {
    let (amount_local, amount_foreign) = match bucket {
        CurrencyBucket::Local => (amount, None),
        CurrencyBucket::Foreign => (Decimal::ZERO, Some(amount)),
    };
    LedgerTransaction {
        id: LedgerTransactionId(Uuid::new_v4().to_string()),
        customer_id,
        kind: TransactionKind::Payment,
        date,
        amount_local,
        amount_foreign,
        bucket,
        linked_budget_id: None,
        is_paid: true,
        paid_method: None,
        paid_date: Some(date),
    }
}

/// Outstanding balance in one bucket: unpaid purchases minus all payments.
pub fn balance(transactions: &[LedgerTransaction], bucket: CurrencyBucket) -> Decimal {
    let mut total = Decimal::ZERO;
    for transaction in transactions {
        let amount = transaction.amount_in_bucket(bucket);
        match transaction.kind {
            TransactionKind::Purchase if !transaction.is_paid => total += amount,
            TransactionKind::Purchase => {}
            TransactionKind::Payment => total -= amount,
        }
    }
    total
}

/// Update a linked transaction after its budget changed: totals, bucket, and
/// paid status are re-mirrored. Marking unpaid clears the settlement fields.
pub fn sync_with_budget(transaction: &mut LedgerTransaction, budget: &Budget) {
    transaction.date = budget.date;
    transaction.amount_local = budget.total_local;
    transaction.amount_foreign = budget.total_foreign;
    transaction.bucket = bucket_for_mode(budget.pricing_mode);
    if budget.is_paid() != transaction.is_paid {
        transaction.is_paid = budget.is_paid();
        if !transaction.is_paid {
            transaction.paid_method = None;
            transaction.paid_date = None;
        }
    }
}
