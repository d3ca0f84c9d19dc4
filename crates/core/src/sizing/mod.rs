//! Deterministic sizing: turns a load description into one recommended
//! configuration drawn from the catalog.
//!
//! Requests are routed as follows:
//! 1. grid-charged (no solar) loads, or every load in [`SizingMode::Engineered`],
//!    go to the component-level custom build in [`custom`];
//! 2. compact dwellings try the cheapest portable unit that covers the draw;
//! 3. everything else is bucketed into a package tier by [`tier::classify`].

pub mod catalog;
pub mod custom;
pub mod tier;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::catalog::CatalogRepository;
use self::custom::EngineeringProfile;
use crate::domain::decision::{
    HomeInstallRecommendation, PortableRecommendation, SizingDecision,
};
use crate::domain::load::LoadRequest;
use crate::errors::ApplicationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Portable units and tier packages, custom builds only for no-solar loads.
    #[default]
    Tiered,
    /// Every load is engineered component by component.
    Engineered,
}

impl std::str::FromStr for SizingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tiered" => Ok(Self::Tiered),
            "engineered" => Ok(Self::Engineered),
            other => Err(format!("unsupported sizing mode `{other}` (expected tiered|engineered)")),
        }
    }
}

#[derive(Clone)]
pub struct SizingEngine {
    catalog: Arc<dyn CatalogRepository>,
    mode: SizingMode,
    profile: EngineeringProfile,
}

impl SizingEngine {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog, mode: SizingMode::default(), profile: EngineeringProfile::default() }
    }

    pub fn with_mode(mut self, mode: SizingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SizingMode {
        self.mode
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogRepository> {
        &self.catalog
    }

    /// Sizes one request. `Err` means the catalog store failed; a load the
    /// catalog cannot cover is `SizingDecision::Unserviceable`.
    pub async fn size(&self, request: &LoadRequest) -> Result<SizingDecision, ApplicationError> {
        if request.no_solar() || self.mode == SizingMode::Engineered {
            let build = custom::build(self.catalog.as_ref(), &self.profile, request).await?;
            debug!(
                event_name = "sizing.custom_build",
                source = ?build.source,
                system_voltage = build.system_voltage,
                total_estimate = build.total_estimate,
                "custom build assembled"
            );
            return Ok(SizingDecision::CustomBuild(build));
        }

        if request.housing().is_compact() {
            if let Some(package) = self.catalog.find_portable_package(request.raw_kw()).await? {
                debug!(
                    event_name = "sizing.portable_match",
                    package = %package.name,
                    "portable package covers the load"
                );
                return Ok(SizingDecision::Portable(PortableRecommendation {
                    specs_summary: format!(
                        "{}kW / {}kWh",
                        package.inverter_kw, package.battery_kwh
                    ),
                    tier_name: package.name,
                    price_estimate: package.est_price_low,
                    description: package.description,
                }));
            }
        }

        let tier = tier::classify(request.raw_kw(), request.raw_kwh());
        let Some(package) = self.catalog.find_package_by_tier(tier).await? else {
            debug!(event_name = "sizing.unserviceable", tier = %tier, "no package for tier");
            return Ok(SizingDecision::unserviceable());
        };

        debug!(
            event_name = "sizing.tier_match",
            tier = %tier,
            package = %package.name,
            "tier package selected"
        );
        Ok(SizingDecision::HomeInstall(HomeInstallRecommendation {
            tier,
            voltage: package.system_voltage,
            inverter_spec: format!("{}kW", package.inverter_kw),
            battery_spec: format!("{}kWh (LiFePO4)", package.battery_kwh),
            price_range_low: package.est_price_low + package.install_cost,
            price_range_high: package.est_price_high + package.install_cost,
            install_fee: package.install_cost,
            tier_name: package.name,
            description: package.description,
        }))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::{market_packages, StaticCatalog};
    use super::{SizingEngine, SizingMode};
    use crate::domain::catalog::{BatteryRow, InstallCostRef, InverterRow, Tier};
    use crate::domain::decision::{BuildSource, SizingDecision, UNSERVICEABLE_REASON};
    use crate::domain::load::{HousingType, LoadRequest};
    use crate::errors::ApplicationError;

    fn engine(catalog: StaticCatalog) -> SizingEngine {
        SizingEngine::new(Arc::new(catalog))
    }

    fn market_catalog() -> StaticCatalog {
        StaticCatalog { packages: market_packages(), ..StaticCatalog::default() }
    }

    fn load(watts: f64, hours: f64, housing: HousingType, no_solar: bool) -> LoadRequest {
        LoadRequest::new(watts, hours, housing, no_solar).expect("valid load")
    }

    #[tokio::test]
    async fn apartment_load_gets_cheapest_covering_portable_unit() {
        let decision = engine(market_catalog())
            .size(&load(500.0, 4.0, HousingType::Apartment, false))
            .await
            .expect("size");

        let SizingDecision::Portable(portable) = decision else {
            panic!("expected portable decision, got {decision:?}");
        };
        assert_eq!(portable.tier_name, "EcoFlow Delta 2");
        assert_eq!(portable.specs_summary, "1.8kW / 1kWh");
        assert_eq!(portable.price_estimate, 2_550_000);
    }

    #[tokio::test]
    async fn compact_dwelling_falls_through_to_tier_when_no_portable_fits() {
        let decision = engine(market_catalog())
            .size(&load(4000.0, 2.0, HousingType::Condo, false))
            .await
            .expect("size");

        assert!(matches!(decision, SizingDecision::HomeInstall(ref home) if home.tier == Tier::C));
    }

    #[tokio::test]
    async fn home_load_escalates_to_standard_tier_with_install_in_price_range() {
        let decision = engine(market_catalog())
            .size(&load(2000.0, 4.0, HousingType::Home, false))
            .await
            .expect("size");

        let SizingDecision::HomeInstall(home) = decision else {
            panic!("expected home install decision, got {decision:?}");
        };
        assert_eq!(home.tier, Tier::C);
        assert_eq!(home.tier_name, "Standard Home (48V)");
        assert_eq!(home.voltage, 48);
        assert_eq!(home.inverter_spec, "6kW");
        assert_eq!(home.battery_spec, "16kWh (LiFePO4)");
        assert_eq!(home.price_range_low, 7_400_000);
        assert_eq!(home.price_range_high, 8_000_000);
        assert_eq!(home.install_fee, 800_000);
    }

    #[tokio::test]
    async fn missing_tier_package_is_unserviceable() {
        let mut catalog = market_catalog();
        catalog.packages.retain(|row| row.tier != Some(Tier::D));

        let decision =
            engine(catalog).size(&load(9000.0, 2.0, HousingType::Home, false)).await.expect("size");

        assert_eq!(
            decision,
            SizingDecision::Unserviceable { reason: UNSERVICEABLE_REASON.to_string() }
        );
    }

    #[tokio::test]
    async fn no_solar_load_without_inverter_rows_uses_industrial_fallback() {
        let decision = engine(StaticCatalog::default())
            .size(&load(6000.0, 1.0, HousingType::Home, true))
            .await
            .expect("size");

        let SizingDecision::CustomBuild(build) = decision else {
            panic!("expected custom build, got {decision:?}");
        };
        assert_eq!(build.source, BuildSource::Components);
        assert_eq!(build.inverter_name, "Industrial / parallel inverter stack");
        assert!((build.inverter_kw - 7.5).abs() < 1e-9);
        assert_eq!(build.system_voltage, 48);
        // 7.5 kWh required from 5 kWh synthetic modules.
        assert_eq!(build.battery_qty, 2);
        assert_eq!(build.solar_panel_count, 0);
        assert_eq!(build.solar_cost, 0);
        assert_eq!(build.equipment_cost, 2_625_000 + 2 * 2_250_000);
        assert_eq!(build.installation_cost, 800_000);
        assert_eq!(build.total_estimate, 7_125_000 + 800_000);
    }

    #[tokio::test]
    async fn largest_accepted_no_solar_load_prices_without_overflow() {
        let decision = engine(StaticCatalog::default())
            .size(&load(1_000_000.0, 168.0, HousingType::Home, true))
            .await
            .expect("size");

        let SizingDecision::CustomBuild(build) = decision else {
            panic!("expected custom build, got {decision:?}");
        };
        // 168 MWh / 0.8 = 210 MWh -> 42,000 synthetic 5 kWh modules.
        assert_eq!(build.battery_qty, 42_000);
        assert_eq!(build.equipment_cost, 437_500_000 + 42_000 * 2_250_000);
        assert_eq!(build.installation_cost, 1_200_000);
        assert_eq!(build.total_estimate, 94_938_700_000);
    }

    #[tokio::test]
    async fn no_solar_load_prefers_bundled_package_when_one_covers_it() {
        let decision = engine(market_catalog())
            .size(&load(6000.0, 1.0, HousingType::Home, true))
            .await
            .expect("size");

        let SizingDecision::CustomBuild(build) = decision else {
            panic!("expected custom build, got {decision:?}");
        };
        assert_eq!(build.source, BuildSource::Bundled);
        assert_eq!(build.inverter_name, "Premium Solar (Off-Grid)");
        assert_eq!(build.total_estimate, 15_500_000);
    }

    #[tokio::test]
    async fn engineered_mode_assembles_components_with_solar_and_cabinet() {
        let catalog = StaticCatalog {
            inverters: vec![
                InverterRow {
                    brand: "Deye".to_string(),
                    model: "Hybrid".to_string(),
                    rated_watts: 6000,
                    system_voltage: 48,
                    max_charge_amps: 120,
                    price: 5_900_000,
                },
                InverterRow {
                    brand: "Growatt".to_string(),
                    model: "SPF 6000 ES Plus".to_string(),
                    rated_watts: 6000,
                    system_voltage: 48,
                    max_charge_amps: 120,
                    price: 1_380_000,
                },
            ],
            batteries: vec![BatteryRow {
                brand: "Lvtopsun".to_string(),
                model: "G4 5kWh".to_string(),
                chemistry: "LiFePO4".to_string(),
                nominal_voltage: 51.2,
                capacity_kwh: 5.0,
                price: 2_000_000,
            }],
            install_refs: vec![InstallCostRef {
                system_voltage: 48,
                labor_cost: 800_000,
                accessories_cost: 400_000,
                mounting_per_panel: 60_000,
                cabinet_cost: 500_000,
            }],
            ..StaticCatalog::default()
        };

        let decision = engine(catalog)
            .with_mode(SizingMode::Engineered)
            .size(&load(2000.0, 10.0, HousingType::Home, false))
            .await
            .expect("size");

        let SizingDecision::CustomBuild(build) = decision else {
            panic!("expected custom build, got {decision:?}");
        };
        // 20 kWh raw / 0.8 = 25 kWh -> five 5 kWh modules, which needs a cabinet.
        assert_eq!(build.inverter_name, "Growatt SPF 6000 ES Plus");
        assert_eq!(build.battery_qty, 5);
        assert!((build.total_storage_kwh - 25.0).abs() < 1e-9);
        // 20 kWh * 1.3 / 4.5 h = 5778 W -> 10 panels.
        assert_eq!(build.solar_panel_count, 10);
        assert_eq!(build.equipment_cost, 1_380_000 + 5 * 2_000_000);
        assert_eq!(build.solar_cost, 3_000_000);
        assert_eq!(build.installation_cost, 800_000 + 400_000 + 600_000 + 500_000);
        assert_eq!(
            build.total_estimate,
            build.equipment_cost + build.solar_cost + build.installation_cost
        );
    }

    #[tokio::test]
    async fn identical_requests_produce_identical_decisions() {
        let engine = engine(market_catalog());
        let request = load(1800.0, 3.0, HousingType::Flat, false);

        let first = engine.size(&request).await.expect("first");
        let second = engine.size(&request).await.expect("second");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn catalog_failure_is_an_error_not_a_decision() {
        let catalog = StaticCatalog { fail: true, ..StaticCatalog::default() };

        let result = engine(catalog).size(&load(500.0, 1.0, HousingType::Home, false)).await;

        assert!(matches!(result, Err(ApplicationError::Persistence(_))));
    }

    #[test]
    fn sizing_mode_parses_case_insensitively() {
        assert_eq!("Engineered".parse::<SizingMode>(), Ok(SizingMode::Engineered));
        assert!("fast".parse::<SizingMode>().is_err());
    }
}
