use crate::commands::{finish, open_database, prepare, CommandResult, StepFailure};
use stocktalk_db::{SampleInventoryDataset, SeedResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        // Reseeding replaces the demo account rather than duplicating it.
        SampleInventoryDataset::clean(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let seeded = SampleInventoryDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = SampleInventoryDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        pool.close().await;

        let failed_checks = verification
            .checks
            .iter()
            .filter_map(|(check, passed)| (!passed).then_some(*check))
            .collect::<Vec<_>>();
        let outcome: Result<String, StepFailure> = if verification.all_present {
            Ok(seed_message(&seeded))
        } else {
            Err(("seed_verification", verification_failure(&failed_checks), 6u8))
        };
        outcome
    });

    finish("seed", result)
}

fn seed_message(seeded: &SeedResult) -> String {
    format!(
        "sample inventory loaded for account `{}`: {} categories, {} products, {} sales",
        seeded.account_id, seeded.categories, seeded.products, seeded.sales
    )
}

fn verification_failure(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
