use meesaya_db::SeedDataset;

use crate::commands::{load_config, migrated_pool, runtime, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;

        let seed_result = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 5u8))?;

        let run_result: Result<Vec<(&'static str, i64)>, StepFailure> =
            if verification.all_present {
                Ok(seed_result.tables)
            } else {
                Err(("seed_verification", verification_message(&verification.checks), 5u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(tables) => {
            let lines: Vec<String> =
                tables.iter().map(|(table, count)| format!("  - {table}: {count} rows")).collect();
            CommandResult::success(
                "seed",
                format!("reference catalog loaded:\n{}", lines.join("\n")),
            )
        }
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
