use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use meesaya_core::domain::catalog::Tier;
use meesaya_core::domain::decision::{BuildSource, SizingDecision};
use meesaya_core::domain::load::{HousingType, LoadRequest};
use meesaya_core::sizing::catalog::CatalogRepository;
use meesaya_core::sizing::SizingEngine;
use meesaya_db::{connect_with_settings, migrations, SeedDataset, SqlCatalogRepository};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

#[derive(Debug, Deserialize)]
struct TierContract {
    code: String,
    name: String,
    system_voltage: u32,
    install_cost: i64,
}

#[derive(Debug, Deserialize)]
struct TableCounts {
    market_packages: i64,
    products_inventory: i64,
    inverter_products: i64,
    battery_products: i64,
    install_cost_refs: i64,
    knowledge_base: i64,
}

#[derive(Debug, Deserialize)]
struct SeedContract {
    dataset_version: String,
    currency: String,
    tables: TableCounts,
    tiers: Vec<TierContract>,
    portables: Vec<String>,
    install_voltages: Vec<u32>,
}

fn load_contract() -> SeedContractTestResult<SeedContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/seed_contract.json"))
        .map_err(|err| format!("seed contract JSON must parse: {err}"))
}

async fn seeded_catalog() -> SeedContractTestResult<SqlCatalogRepository> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|err| format!("connect: {err}"))?;
    migrations::run_pending(&pool).await.map_err(|err| format!("migrate: {err}"))?;
    SeedDataset::load(&pool).await.map_err(|err| format!("seed: {err}"))?;
    Ok(SqlCatalogRepository::new(pool))
}

fn load(watts: f64, hours: f64, housing: HousingType, no_solar: bool) -> LoadRequest {
    LoadRequest::new(watts, hours, housing, no_solar).expect("valid load")
}

#[test]
fn seed_contract_matches_seed_sql_fixture() -> SeedContractTestResult {
    let fixture_sql = SeedDataset::SQL;
    let contract = load_contract()?;
    let mut codes_seen = HashSet::new();

    require!(!contract.dataset_version.is_empty());
    require_eq!(contract.currency, "MMK");
    require_eq!(contract.tiers.len(), 4);

    for tier in &contract.tiers {
        require!(codes_seen.insert(tier.code.clone()), "duplicate tier code: {}", tier.code);
        require!(
            tier.code.parse::<Tier>().is_ok(),
            "tier code {} should parse as a catalog tier",
            tier.code
        );
        require!(
            fixture_sql.contains(&format!("('{}', '{}', {}", tier.code, tier.name, tier.system_voltage)),
            "seed SQL fixture should include package row for tier {}",
            tier.code
        );
        require!(
            fixture_sql.contains(&format!("{}, '", tier.install_cost)),
            "seed SQL fixture should include install cost {} for tier {}",
            tier.install_cost,
            tier.code
        );
    }

    for portable in &contract.portables {
        require!(
            fixture_sql.contains(&format!("(NULL, '{portable}'")),
            "seed SQL fixture should include untiered portable {}",
            portable
        );
    }

    for voltage in &contract.install_voltages {
        require!(
            fixture_sql.contains(&format!("\n    ({voltage}, ")),
            "seed SQL fixture should include install cost reference for {}V",
            voltage
        );
    }

    require_eq!(contract.tables.market_packages, (contract.tiers.len() + contract.portables.len()) as i64);
    require_eq!(contract.tables.install_cost_refs, contract.install_voltages.len() as i64);
    Ok(())
}

#[tokio::test]
async fn seeded_table_counts_match_contract() -> SeedContractTestResult {
    let contract = load_contract()?;
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|err| format!("connect: {err}"))?;
    migrations::run_pending(&pool).await.map_err(|err| format!("migrate: {err}"))?;

    let result = SeedDataset::load(&pool).await.map_err(|err| format!("seed: {err}"))?;
    let counts: std::collections::HashMap<_, _> = result.tables.into_iter().collect();

    require_eq!(counts.get("market_packages").copied(), Some(contract.tables.market_packages));
    require_eq!(
        counts.get("products_inventory").copied(),
        Some(contract.tables.products_inventory)
    );
    require_eq!(counts.get("inverter_products").copied(), Some(contract.tables.inverter_products));
    require_eq!(counts.get("battery_products").copied(), Some(contract.tables.battery_products));
    require_eq!(counts.get("install_cost_refs").copied(), Some(contract.tables.install_cost_refs));
    require_eq!(counts.get("knowledge_base").copied(), Some(contract.tables.knowledge_base));
    Ok(())
}

#[tokio::test]
async fn seeded_tiers_resolve_through_catalog_repository() -> SeedContractTestResult {
    let contract = load_contract()?;
    let catalog = seeded_catalog().await?;

    for tier in &contract.tiers {
        let code = tier.code.parse::<Tier>().map_err(|err| err.to_string())?;
        let row = catalog
            .find_package_by_tier(code)
            .await
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("tier {} should resolve", tier.code))?;
        require_eq!(row.name, tier.name);
        require_eq!(row.system_voltage, tier.system_voltage);
        require_eq!(row.install_cost, tier.install_cost);
        require!(!row.is_portable);
    }
    Ok(())
}

#[tokio::test]
async fn apartment_load_sizes_to_cheapest_portable_from_seed() -> SeedContractTestResult {
    let engine = SizingEngine::new(Arc::new(seeded_catalog().await?));

    let decision = engine
        .size(&load(500.0, 4.0, HousingType::Apartment, false))
        .await
        .map_err(|err| err.to_string())?;

    match decision {
        SizingDecision::Portable(portable) => {
            require_eq!(portable.tier_name, "EcoFlow Delta 2");
            require_eq!(portable.price_estimate, 2_550_000);
            Ok(())
        }
        other => Err(format!("expected portable decision, got {other:?}")),
    }
}

#[tokio::test]
async fn home_load_sizes_to_standard_tier_from_seed() -> SeedContractTestResult {
    let engine = SizingEngine::new(Arc::new(seeded_catalog().await?));

    let decision = engine
        .size(&load(2000.0, 4.0, HousingType::Home, false))
        .await
        .map_err(|err| err.to_string())?;

    match decision {
        SizingDecision::HomeInstall(home) => {
            require_eq!(home.tier, Tier::C);
            require_eq!(home.price_range_low, 7_400_000);
            require_eq!(home.price_range_high, 8_000_000);
            Ok(())
        }
        other => Err(format!("expected home install decision, got {other:?}")),
    }
}

#[tokio::test]
async fn no_solar_load_prefers_seeded_bundle() -> SeedContractTestResult {
    let engine = SizingEngine::new(Arc::new(seeded_catalog().await?));

    // 1.5 kW for 2 h: 1875 W inverter and 3.75 kWh at 24 V, which Tier B covers.
    let decision = engine
        .size(&load(1500.0, 2.0, HousingType::Home, true))
        .await
        .map_err(|err| err.to_string())?;

    match decision {
        SizingDecision::CustomBuild(build) => {
            require_eq!(build.source, BuildSource::Bundled);
            require_eq!(build.system_voltage, 24);
            require_eq!(build.inverter_name, "Mid-Range (24V)");
            require_eq!(build.total_estimate, 4_200_000);
            Ok(())
        }
        other => Err(format!("expected custom build, got {other:?}")),
    }
}

#[tokio::test]
async fn oversized_no_solar_load_assembles_components_from_seed() -> SeedContractTestResult {
    let engine = SizingEngine::new(Arc::new(seeded_catalog().await?));

    // 12 kW surge-adjusted exceeds every package and every seeded inverter.
    let decision = engine
        .size(&load(9600.0, 1.0, HousingType::Home, true))
        .await
        .map_err(|err| err.to_string())?;

    match decision {
        SizingDecision::CustomBuild(build) => {
            require_eq!(build.source, BuildSource::Components);
            require_eq!(build.inverter_name, "Industrial / parallel inverter stack");
            require_eq!(build.system_voltage, 48);
            require_eq!(build.battery_model, "Lvtopsun G4 51.2V 100Ah");
            // 9.6 kWh / 0.8 = 12 kWh over 5.12 kWh modules.
            require_eq!(build.battery_qty, 3);
            require_eq!(build.solar_panel_count, 0);
            require_eq!(
                build.total_estimate,
                build.equipment_cost + build.solar_cost + build.installation_cost
            );
            Ok(())
        }
        other => Err(format!("expected custom build, got {other:?}")),
    }
}
