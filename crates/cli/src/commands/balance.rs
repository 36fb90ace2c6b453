use serde_json::json;

use marea_core::domain::ledger::CurrencyBucket;
use marea_core::ledger::balance;
use marea_db::repositories::{
    CustomerRepository, LedgerRepository, SqlCustomerRepository, SqlLedgerRepository,
};

use super::{with_pool, CommandResult};

pub fn run(customer_name: &str, bucket: &str) -> CommandResult {
    let name = customer_name.to_string();
    let bucket = bucket.to_string();
    with_pool("balance", move |pool| async move {
        let customers = SqlCustomerRepository::new(pool.clone());
        let customer = customers
            .find_by_name(&name)
            .await
            .map_err(|error| ("repository", error.to_string(), 5u8))?
            .ok_or_else(|| ("not_found", format!("customer `{name}` not found"), 1u8))?;

        let ledger = SqlLedgerRepository::new(pool);
        let transactions = ledger
            .list_for_customer(&customer.id)
            .await
            .map_err(|error| ("repository", error.to_string(), 5u8))?;

        let mut data = json!({
            "customer": customer.name,
            "transactions": transactions.len(),
        });
        if bucket == "local" || bucket == "both" {
            data["balance_local"] =
                json!(balance(&transactions, CurrencyBucket::Local).to_string());
        }
        if bucket == "foreign" || bucket == "both" {
            data["balance_foreign"] =
                json!(balance(&transactions, CurrencyBucket::Foreign).to_string());
        }

        Ok(CommandResult::success_with_data(
            "balance",
            format!("balance for `{}`", customer.name),
            Some(data),
        ))
    })
}
