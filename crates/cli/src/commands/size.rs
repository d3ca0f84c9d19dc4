use std::sync::Arc;

use meesaya_agent::tools::render_decision;
use meesaya_core::domain::load::{HousingType, LoadRequest};
use meesaya_core::sizing::SizingEngine;
use meesaya_db::SqlCatalogRepository;
use serde_json::json;

use crate::commands::{load_config, migrated_pool, runtime, CommandResult};

#[derive(Clone, Debug)]
pub struct SizeArgs {
    pub watts: f64,
    pub hours: f64,
    pub housing: String,
    pub no_solar: bool,
}

/// Sizes one load against the configured catalog and prints the decision.
pub fn run(args: &SizeArgs) -> CommandResult {
    let housing = HousingType::parse_lenient(&args.housing);
    let request = match LoadRequest::new(args.watts, args.hours, housing, args.no_solar) {
        Ok(request) => request,
        Err(error) => return CommandResult::failure("size", "invalid_load", error.to_string(), 2),
    };
    let config = match load_config("size") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("size") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let engine = SizingEngine::new(Arc::new(SqlCatalogRepository::new(pool.clone())))
            .with_mode(config.sizing.mode);
        let decision =
            engine.size(&request).await.map_err(|error| ("sizing", error.to_string(), 4u8));
        pool.close().await;
        decision
    });

    match result {
        Ok(decision) => CommandResult::success_with_data(
            "size",
            render_decision(&decision),
            Some(json!({
                "request": request,
                "decision": decision,
            })),
        ),
        Err(failure) => CommandResult::from_step("size", failure),
    }
}
