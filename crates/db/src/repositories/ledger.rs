use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use marea_core::domain::budget::BudgetId;
use marea_core::domain::customer::CustomerId;
use marea_core::domain::ledger::{
    CurrencyBucket, LedgerTransaction, LedgerTransactionId, TransactionKind,
};

use super::budget::{parse_date, parse_decimal};
use super::{LedgerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLedgerRepository {
    pool: DbPool,
}

const SELECT_COLUMNS: &str = "id, customer_id, kind, date, amount_local, amount_foreign, \
     bucket, linked_budget_id, is_paid, paid_method, paid_date";

impl SqlLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn transaction_from_row(row: &SqliteRow) -> Result<LedgerTransaction, RepositoryError> {
        let id: String = row.try_get("id")?;
        let customer_id: String = row.try_get("customer_id")?;
        let kind: String = row.try_get("kind")?;
        let date: String = row.try_get("date")?;
        let amount_local: String = row.try_get("amount_local")?;
        let amount_foreign: Option<String> = row.try_get("amount_foreign")?;
        let bucket: String = row.try_get("bucket")?;
        let linked_budget_id: Option<String> = row.try_get("linked_budget_id")?;
        let is_paid: i64 = row.try_get("is_paid")?;
        let paid_method: Option<String> = row.try_get("paid_method")?;
        let paid_date: Option<String> = row.try_get("paid_date")?;

        let customer_id = Uuid::from_str(&customer_id).map_err(|error| {
            RepositoryError::Decode(format!("invalid customer_id `{customer_id}`: {error}"))
        })?;

        Ok(LedgerTransaction {
            id: LedgerTransactionId(id),
            customer_id: CustomerId(customer_id),
            kind: kind_from_str(&kind)?,
            date: parse_date("date", &date)?,
            amount_local: parse_decimal("amount_local", &amount_local)?,
            amount_foreign: amount_foreign
                .map(|text| parse_decimal("amount_foreign", &text))
                .transpose()?,
            bucket: bucket_from_str(&bucket)?,
            linked_budget_id: linked_budget_id.map(BudgetId),
            is_paid: is_paid != 0,
            paid_method,
            paid_date: paid_date.map(|text| parse_date("paid_date", &text)).transpose()?,
        })
    }
}

#[async_trait]
impl LedgerRepository for SqlLedgerRepository {
    async fn find_by_id(
        &self,
        id: &LedgerTransactionId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM ledger_transaction WHERE id = ?");
        let row = sqlx::query(&query).bind(&id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::transaction_from_row).transpose()
    }

    async fn find_by_budget_id(
        &self,
        budget_id: &BudgetId,
    ) -> Result<Option<LedgerTransaction>, RepositoryError> {
        let query =
            format!("SELECT {SELECT_COLUMNS} FROM ledger_transaction WHERE linked_budget_id = ?");
        let row = sqlx::query(&query).bind(&budget_id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::transaction_from_row).transpose()
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LedgerTransaction>, RepositoryError> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM ledger_transaction WHERE customer_id = ? ORDER BY date ASC, id ASC"
        );
        let rows =
            sqlx::query(&query).bind(customer_id.0.to_string()).fetch_all(&self.pool).await?;
        rows.iter().map(Self::transaction_from_row).collect()
    }

    async fn save(&self, transaction: LedgerTransaction) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_transaction (
                id, customer_id, kind, date, amount_local, amount_foreign,
                bucket, linked_budget_id, is_paid, paid_method, paid_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                kind = excluded.kind,
                date = excluded.date,
                amount_local = excluded.amount_local,
                amount_foreign = excluded.amount_foreign,
                bucket = excluded.bucket,
                linked_budget_id = excluded.linked_budget_id,
                is_paid = excluded.is_paid,
                paid_method = excluded.paid_method,
                paid_date = excluded.paid_date
            "#,
        )
        .bind(&transaction.id.0)
        .bind(transaction.customer_id.0.to_string())
        .bind(kind_to_str(transaction.kind))
        .bind(transaction.date.to_string())
        .bind(transaction.amount_local.to_string())
        .bind(transaction.amount_foreign.map(|amount| amount.to_string()))
        .bind(bucket_to_str(transaction.bucket))
        .bind(transaction.linked_budget_id.as_ref().map(|id| id.0.clone()))
        .bind(i64::from(transaction.is_paid))
        .bind(&transaction.paid_method)
        .bind(transaction.paid_date.map(|date| date.to_string()))
        .execute(&self.pool)
        .await?;
        tracing::debug!(transaction_id = %transaction.id.0, "ledger transaction saved");
        Ok(())
    }
}

fn kind_to_str(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Purchase => "purchase",
        TransactionKind::Payment => "payment",
    }
}

fn kind_from_str(text: &str) -> Result<TransactionKind, RepositoryError> {
    match text {
        "purchase" => Ok(TransactionKind::Purchase),
        "payment" => Ok(TransactionKind::Payment),
        other => Err(RepositoryError::Decode(format!("unknown transaction kind `{other}`"))),
    }
}

fn bucket_to_str(bucket: CurrencyBucket) -> &'static str {
    match bucket {
        CurrencyBucket::Local => "local",
        CurrencyBucket::Foreign => "foreign",
    }
}

fn bucket_from_str(text: &str) -> Result<CurrencyBucket, RepositoryError> {
    match text {
        "local" => Ok(CurrencyBucket::Local),
        "foreign" => Ok(CurrencyBucket::Foreign),
        other => Err(RepositoryError::Decode(format!("unknown currency bucket `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use marea_core::domain::budget::BudgetId;
    use marea_core::domain::customer::{Customer, CustomerId};
    use marea_core::domain::ledger::{
        CurrencyBucket, LedgerTransaction, LedgerTransactionId, TransactionKind,
    };

    use crate::repositories::{
        CustomerRepository, LedgerRepository, SqlCustomerRepository, SqlLedgerRepository,
    };
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    async fn seeded_customer(pool: &DbPool) -> CustomerId {
        let customer = Customer {
            id: CustomerId(Uuid::new_v4()),
            name: "Delcy Rodriguez".to_string(),
            address: None,
            active: true,
        };
        SqlCustomerRepository::new(pool.clone()).save(customer.clone()).await.expect("seed");
        customer.id
    }

    fn transaction(customer_id: CustomerId, budget: Option<&str>) -> LedgerTransaction {
        LedgerTransaction {
            id: LedgerTransactionId(Uuid::new_v4().to_string()),
            customer_id,
            kind: TransactionKind::Purchase,
            date: NaiveDate::from_ymd_opt(2025, 8, 1).expect("date"),
            amount_local: Decimal::from(120),
            amount_foreign: None,
            bucket: CurrencyBucket::Local,
            linked_budget_id: budget.map(|id| BudgetId(id.to_string())),
            is_paid: false,
            paid_method: None,
            paid_date: None,
        }
    }

    #[tokio::test]
    async fn find_by_budget_id_sees_the_linked_row() {
        let pool = pool().await;
        let customer_id = seeded_customer(&pool).await;
        let repo = SqlLedgerRepository::new(pool);

        let unlinked = transaction(customer_id, None);
        repo.save(unlinked).await.expect("save unlinked");

        let found = repo
            .find_by_budget_id(&BudgetId("missing".to_string()))
            .await
            .expect("lookup");
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn list_for_customer_round_trips_rows() {
        let pool = pool().await;
        let customer_id = seeded_customer(&pool).await;
        let repo = SqlLedgerRepository::new(pool);

        let transaction = transaction(customer_id, None);
        repo.save(transaction.clone()).await.expect("save");

        let listed = repo.list_for_customer(&customer_id).await.expect("list");
        assert_eq!(listed, vec![transaction]);
    }
}
