use marea_core::domain::budget::BudgetId;
use marea_db::repositories::{BudgetRepository, SqlBudgetRepository};

use super::{with_pool, CommandResult};

pub fn run(budget_id: &str) -> CommandResult {
    let id = BudgetId(budget_id.to_string());
    with_pool("show", move |pool| async move {
        let repo = SqlBudgetRepository::new(pool);
        let budget = repo
            .find_by_id(&id)
            .await
            .map_err(|error| ("repository", error.to_string(), 5u8))?
            .ok_or_else(|| ("not_found", format!("budget `{}` not found", id.0), 1u8))?;

        let data = serde_json::to_value(&budget)
            .map_err(|error| ("serialization", error.to_string(), 5u8))?;
        Ok(CommandResult::success_with_data(
            "show",
            format!("budget `{}`", budget.id.0),
            Some(data),
        ))
    })
}
