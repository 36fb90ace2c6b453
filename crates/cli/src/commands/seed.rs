use marea_db::{migrations, DemoSeedDataset};

use super::{with_pool, CommandResult};

pub fn run() -> CommandResult {
    with_pool("seed", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_load", error.to_string(), 6u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verify", error.to_string(), 6u8))?;
        if !verification.all_present {
            let missing: Vec<&str> = verification
                .checks
                .iter()
                .filter(|(_, present)| !present)
                .map(|(label, _)| *label)
                .collect();
            return Err(("seed_verify", format!("missing after load: {missing:?}"), 6u8));
        }

        Ok(CommandResult::success(
            "seed",
            format!(
                "loaded demo fixtures: {} products, {} customers",
                result.products_seeded, result.customers_seeded
            ),
        ))
    })
}
