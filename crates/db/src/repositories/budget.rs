use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use marea_core::domain::budget::{Budget, BudgetId, BudgetLine, BudgetStatus, PricingMode};

use super::{BudgetRepository, RepositoryError};
use crate::DbPool;

/// SQLite-backed budget store. The line list is persisted as one JSON
/// document per row and rewritten wholly on every save.
pub struct SqlBudgetRepository {
    pool: DbPool,
}

impl SqlBudgetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn budget_from_row(row: &SqliteRow) -> Result<Budget, RepositoryError> {
        let id: String = row.try_get("id")?;
        let date: String = row.try_get("date")?;
        let lines_json: String = row.try_get("lines_json")?;
        let delivery_fee: String = row.try_get("delivery_fee")?;
        let pricing_mode: String = row.try_get("pricing_mode")?;
        let hide_rate: i64 = row.try_get("hide_rate")?;
        let status: String = row.try_get("status")?;
        let customer_name: Option<String> = row.try_get("customer_name")?;
        let customer_address: Option<String> = row.try_get("customer_address")?;
        let total_local: String = row.try_get("total_local")?;
        let total_foreign: Option<String> = row.try_get("total_foreign")?;

        let lines: Vec<BudgetLine> = serde_json::from_str(&lines_json).map_err(|error| {
            RepositoryError::Decode(format!("failed to decode lines_json: {error}"))
        })?;

        Ok(Budget {
            id: BudgetId(id),
            date: parse_date("date", &date)?,
            lines,
            delivery_fee: parse_decimal("delivery_fee", &delivery_fee)?,
            pricing_mode: pricing_mode_from_str(&pricing_mode)?,
            hide_rate: hide_rate != 0,
            status: status_from_str(&status)?,
            customer_name,
            customer_address,
            total_local: parse_decimal("total_local", &total_local)?,
            total_foreign: total_foreign
                .map(|text| parse_decimal("total_foreign", &text))
                .transpose()?,
        })
    }
}

#[async_trait]
impl BudgetRepository for SqlBudgetRepository {
    async fn find_by_id(&self, id: &BudgetId) -> Result<Option<Budget>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, date, lines_json, delivery_fee, pricing_mode, hide_rate,
                   status, customer_name, customer_address, total_local, total_foreign
            FROM budget
            WHERE id = ?
            "#,
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::budget_from_row).transpose()
    }

    async fn save(&self, budget: Budget) -> Result<(), RepositoryError> {
        let lines_json = serde_json::to_string(&budget.lines).map_err(|error| {
            RepositoryError::Decode(format!("failed to encode lines_json: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO budget (
                id, date, lines_json, delivery_fee, pricing_mode, hide_rate,
                status, customer_name, customer_address, total_local, total_foreign, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                date = excluded.date,
                lines_json = excluded.lines_json,
                delivery_fee = excluded.delivery_fee,
                pricing_mode = excluded.pricing_mode,
                hide_rate = excluded.hide_rate,
                status = excluded.status,
                customer_name = excluded.customer_name,
                customer_address = excluded.customer_address,
                total_local = excluded.total_local,
                total_foreign = excluded.total_foreign,
                updated_at = datetime('now')
            "#,
        )
        .bind(&budget.id.0)
        .bind(budget.date.to_string())
        .bind(lines_json)
        .bind(budget.delivery_fee.to_string())
        .bind(pricing_mode_to_str(budget.pricing_mode))
        .bind(i64::from(budget.hide_rate))
        .bind(status_to_str(budget.status))
        .bind(&budget.customer_name)
        .bind(&budget.customer_address)
        .bind(budget.total_local.to_string())
        .bind(budget.total_foreign.map(|total| total.to_string()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(budget_id = %budget.id.0, lines = budget.lines.len(), "budget saved");
        Ok(())
    }

    async fn delete(&self, id: &BudgetId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM budget WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        tracing::debug!(budget_id = %id.0, "budget deleted");
        Ok(())
    }
}

pub(crate) fn parse_decimal(field: &str, text: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(text)
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal in `{field}`: {error}")))
}

pub(crate) fn parse_date(field: &str, text: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::from_str(text)
        .map_err(|error| RepositoryError::Decode(format!("invalid date in `{field}`: {error}")))
}

pub(crate) fn pricing_mode_to_str(mode: PricingMode) -> &'static str {
    match mode {
        PricingMode::Local => "local",
        PricingMode::Foreign => "foreign",
        PricingMode::Dual => "dual",
    }
}

pub(crate) fn pricing_mode_from_str(text: &str) -> Result<PricingMode, RepositoryError> {
    match text {
        "local" => Ok(PricingMode::Local),
        "foreign" => Ok(PricingMode::Foreign),
        "dual" => Ok(PricingMode::Dual),
        other => Err(RepositoryError::Decode(format!("unknown pricing_mode `{other}`"))),
    }
}

pub(crate) fn status_to_str(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Pending => "pending",
        BudgetStatus::Paid => "paid",
    }
}

pub(crate) fn status_from_str(text: &str) -> Result<BudgetStatus, RepositoryError> {
    match text {
        "pending" => Ok(BudgetStatus::Pending),
        "paid" => Ok(BudgetStatus::Paid),
        other => Err(RepositoryError::Decode(format!("unknown budget status `{other}`"))),
    }
}
