use async_trait::async_trait;

use crate::domain::catalog::{
    BatteryRow, InstallCostRef, InverterRow, PackageRow, ProductRow, Tier, VoltageRange,
};
use crate::errors::ApplicationError;

/// Read-only, ordered catalog lookups.
///
/// Every lookup may legitimately find nothing; that is `Ok(None)` (or an empty
/// vec), never an error. `Err` is reserved for the store itself failing.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Cheapest portable package rated at or above `min_kw`.
    async fn find_portable_package(
        &self,
        min_kw: f64,
    ) -> Result<Option<PackageRow>, ApplicationError>;

    /// The package row tagged with `tier`.
    async fn find_package_by_tier(&self, tier: Tier)
        -> Result<Option<PackageRow>, ApplicationError>;

    /// Cheapest inverter meeting the wattage, voltage and charge-current minimums.
    async fn find_inverter(
        &self,
        min_watts: f64,
        voltage: u32,
        min_charge_amps: f64,
    ) -> Result<Option<InverterRow>, ApplicationError>;

    /// Cheapest battery module inside the voltage band with the given chemistry.
    async fn find_battery(
        &self,
        voltage_range: VoltageRange,
        chemistry: &str,
    ) -> Result<Option<BatteryRow>, ApplicationError>;

    async fn find_install_cost_ref(
        &self,
        voltage: u32,
    ) -> Result<Option<InstallCostRef>, ApplicationError>;

    /// Cheapest fixed-install package covering the engineered minimums,
    /// ordered by hardware plus install cost.
    async fn find_bundled_package(
        &self,
        min_watts: f64,
        min_kwh: f64,
        voltage: u32,
    ) -> Result<Option<PackageRow>, ApplicationError>;

    /// Case-insensitive substring search over brand, model and category.
    async fn search_products(
        &self,
        text: &str,
        limit: u32,
    ) -> Result<Vec<ProductRow>, ApplicationError>;
}
