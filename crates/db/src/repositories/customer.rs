use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use marea_core::domain::customer::{Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn customer_from_row(row: &SqliteRow) -> Result<Customer, RepositoryError> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let address: Option<String> = row.try_get("address")?;
        let active: i64 = row.try_get("active")?;

        let id = Uuid::from_str(&id).map_err(|error| {
            RepositoryError::Decode(format!("invalid customer id `{id}`: {error}"))
        })?;

        Ok(Customer { id: CustomerId(id), name, address, active: active != 0 })
    }
}

#[async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, address, active FROM customer WHERE id = ?")
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::customer_from_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, address, active FROM customer WHERE LOWER(name) = LOWER(?) LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::customer_from_row).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, address, active FROM customer WHERE active = 1 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::customer_from_row).collect()
    }

    async fn save(&self, customer: Customer) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO customer (id, name, address, active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                active = excluded.active
            "#,
        )
        .bind(customer.id.0.to_string())
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(i64::from(customer.active))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use marea_core::domain::customer::{Customer, CustomerId};

    use crate::repositories::{CustomerRepository, SqlCustomerRepository};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlCustomerRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlCustomerRepository::new(pool)
    }

    fn customer(name: &str, active: bool) -> Customer {
        Customer { id: CustomerId(Uuid::new_v4()), name: name.to_string(), address: None, active }
    }

    #[tokio::test]
    async fn find_by_name_is_case_insensitive() {
        let repo = repo().await;
        let delcy = customer("Delcy Rodriguez", true);
        repo.save(delcy.clone()).await.expect("save");

        let found = repo.find_by_name("delcy rodriguez").await.expect("find");
        assert_eq!(found, Some(delcy));
    }

    #[tokio::test]
    async fn list_active_excludes_inactive_customers() {
        let repo = repo().await;
        repo.save(customer("Activa", true)).await.expect("save active");
        repo.save(customer("Retirada", false)).await.expect("save inactive");

        let listed = repo.list_active().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Activa");
    }
}
