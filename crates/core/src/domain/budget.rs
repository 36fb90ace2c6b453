use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetId(pub String);

/// Which price basis (or both) a budget's totals are computed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    Local,
    Foreign,
    Dual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Pending,
    Paid,
}

/// One priced line of a budget. Both bases are always computed; the pricing
/// mode decides which of them surfaces in the budget totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price_local: Decimal,
    pub unit_price_foreign: Decimal,
    pub subtotal_local: Decimal,
    pub subtotal_foreign: Decimal,
}

impl BudgetLine {
    /// Rebuild both subtotals from the current quantity and unit prices.
    pub fn rescale(&mut self) {
        self.subtotal_local = (self.unit_price_local * self.quantity).round_dp(2);
        self.subtotal_foreign = (self.unit_price_foreign * self.quantity).round_dp(2);
    }
}

/// The quoted, mutable order document. Totals are derived state: every
/// mutation path must call `recompute_totals` before persisting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub date: NaiveDate,
    pub lines: Vec<BudgetLine>,
    pub delivery_fee: Decimal,
    pub pricing_mode: PricingMode,
    pub hide_rate: bool,
    pub status: BudgetStatus,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub total_local: Decimal,
    pub total_foreign: Option<Decimal>,
}

impl Budget {
    pub fn new(id: BudgetId, date: NaiveDate, pricing_mode: PricingMode) -> Self {
        let mut budget = Self {
            id,
            date,
            lines: Vec::new(),
            delivery_fee: Decimal::ZERO,
            pricing_mode,
            hide_rate: false,
            status: BudgetStatus::Pending,
            customer_name: None,
            customer_address: None,
            total_local: Decimal::ZERO,
            total_foreign: None,
        };
        budget.recompute_totals();
        budget
    }

    /// Enforces the two totals invariants:
    /// total_local = sum(subtotal_local) + delivery_fee, and total_foreign is
    /// present iff the pricing mode is not Local. A Dual budget with no
    /// foreign-priced lines still carries Some(delivery_fee), never None.
    pub fn recompute_totals(&mut self) {
        let subtotal_local: Decimal = self.lines.iter().map(|line| line.subtotal_local).sum();
        self.total_local = (subtotal_local + self.delivery_fee).round_dp(2);

        self.total_foreign = match self.pricing_mode {
            PricingMode::Local => None,
            PricingMode::Foreign | PricingMode::Dual => {
                let subtotal_foreign: Decimal =
                    self.lines.iter().map(|line| line.subtotal_foreign).sum();
                Some((subtotal_foreign + self.delivery_fee).round_dp(2))
            }
        };
    }

    pub fn mark_paid(&mut self) {
        self.status = BudgetStatus::Paid;
    }

    pub fn mark_unpaid(&mut self) {
        self.status = BudgetStatus::Pending;
    }

    pub fn is_paid(&self) -> bool {
        self.status == BudgetStatus::Paid
    }
}
