use marea_db::migrations;

use super::{with_pool, CommandResult};

pub fn run() -> CommandResult {
    with_pool("migrate", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
