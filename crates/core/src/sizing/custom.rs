//! Component-level sizing for loads that the tier packages do not fit, such as
//! grid-charged systems with no solar array.

use super::catalog::CatalogRepository;
use crate::domain::catalog::{InstallCostRef, PackageRow, VoltageRange};
use crate::domain::decision::{BuildSource, CustomBuildRecommendation};
use crate::domain::load::LoadRequest;
use crate::errors::{ApplicationError, DomainError};

const RATIO_EPSILON: f64 = 1e-9;

/// Engineering constants behind the custom-build path.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineeringProfile {
    pub surge_factor: f64,
    pub dod_efficiency: f64,
    pub mid_voltage_watts: f64,
    pub mid_voltage_kwh: f64,
    pub high_voltage_watts: f64,
    pub high_voltage_kwh: f64,
    pub charge_window_hours: f64,
    pub max_charge_amps: f64,
    pub fast_charge_inverter_floor_watts: f64,
    pub battery_chemistry: String,
    pub battery_band_low: f64,
    pub battery_band_high: f64,
    pub synthetic_inverter_price_per_watt: f64,
    pub synthetic_battery_unit_kwh: f64,
    pub synthetic_battery_price_per_kwh: f64,
    pub default_install: InstallCostRef,
    pub solar_margin: f64,
    pub sun_hours: f64,
    pub panel_watts: f64,
    pub panel_price: i64,
    pub cabinet_unit_threshold: u32,
    pub cabinet_kwh_threshold: f64,
}

impl Default for EngineeringProfile {
    fn default() -> Self {
        Self {
            surge_factor: 1.25,
            dod_efficiency: 0.8,
            mid_voltage_watts: 1500.0,
            mid_voltage_kwh: 2.5,
            high_voltage_watts: 3500.0,
            high_voltage_kwh: 5.0,
            charge_window_hours: 4.0,
            max_charge_amps: 50.0,
            fast_charge_inverter_floor_watts: 6000.0,
            battery_chemistry: "LiFePO4".to_string(),
            battery_band_low: 0.9,
            battery_band_high: 1.2,
            synthetic_inverter_price_per_watt: 350.0,
            synthetic_battery_unit_kwh: 5.0,
            synthetic_battery_price_per_kwh: 450_000.0,
            default_install: InstallCostRef {
                system_voltage: 0,
                labor_cost: 500_000,
                accessories_cost: 300_000,
                mounting_per_panel: 50_000,
                cabinet_cost: 400_000,
            },
            solar_margin: 1.3,
            sun_hours: 4.5,
            panel_watts: 590.0,
            panel_price: 300_000,
            cabinet_unit_threshold: 4,
            cabinet_kwh_threshold: 20.0,
        }
    }
}

/// Minimums derived from a load before any catalog lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineeredLoad {
    pub inverter_watts: f64,
    pub required_kwh: f64,
    pub system_voltage: u32,
    /// Charge current the inverter must supply; zero when solar recharges the bank.
    pub charge_amps: f64,
}

impl EngineeringProfile {
    pub fn engineer(&self, request: &LoadRequest) -> EngineeredLoad {
        let mut inverter_watts = request.watts() * self.surge_factor;
        let required_kwh = request.raw_kwh() / self.dod_efficiency;
        let mut system_voltage = self.select_voltage(request.watts(), required_kwh);
        let mut charge_amps = 0.0;

        if request.no_solar() {
            charge_amps = self.charge_amps(required_kwh, system_voltage);
            if charge_amps > self.max_charge_amps {
                system_voltage = 48;
                inverter_watts = inverter_watts.max(self.fast_charge_inverter_floor_watts);
                charge_amps = self.charge_amps(required_kwh, system_voltage);
            }
        }

        EngineeredLoad { inverter_watts, required_kwh, system_voltage, charge_amps }
    }

    fn select_voltage(&self, watts: f64, required_kwh: f64) -> u32 {
        if watts > self.high_voltage_watts || required_kwh > self.high_voltage_kwh {
            48
        } else if watts > self.mid_voltage_watts || required_kwh > self.mid_voltage_kwh {
            24
        } else {
            12
        }
    }

    fn charge_amps(&self, required_kwh: f64, system_voltage: u32) -> f64 {
        required_kwh * 1000.0 / f64::from(system_voltage) / self.charge_window_hours
    }

    pub fn panel_count(&self, raw_kwh: f64) -> Option<u32> {
        let daily_need_kwh = raw_kwh * self.solar_margin;
        let array_watts = daily_need_kwh * 1000.0 / self.sun_hours;
        ceil_ratio(array_watts, self.panel_watts)
    }

    fn needs_cabinet(&self, battery_qty: u32, total_storage_kwh: f64) -> bool {
        battery_qty > self.cabinet_unit_threshold || total_storage_kwh > self.cabinet_kwh_threshold
    }
}

/// Whole units needed to cover `required`. Exact multiples are not rounded up;
/// anything above one is. `None` when the count does not fit a `u32`.
pub fn ceil_ratio(required: f64, per_unit: f64) -> Option<u32> {
    if required <= 0.0 || per_unit <= 0.0 {
        return Some(0);
    }
    let ratio = required / per_unit;
    let nearest = ratio.round();
    let units = if (ratio - nearest).abs() <= RATIO_EPSILON * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    if units.is_finite() && units <= f64::from(u32::MAX) {
        Some(units as u32)
    } else {
        None
    }
}

/// Rounds a computed MMK figure up to whole kyat.
fn whole_kyat(amount: f64, what: &'static str) -> Result<i64, DomainError> {
    let rounded = amount.ceil();
    // 2^63 is exactly representable; anything at or above it does not fit.
    if rounded.is_finite() && rounded >= 0.0 && rounded < i64::MAX as f64 {
        Ok(rounded as i64)
    } else {
        Err(DomainError::BuildOutOfRange(what))
    }
}

fn checked_sum(parts: &[i64], what: &'static str) -> Result<i64, DomainError> {
    parts
        .iter()
        .try_fold(0_i64, |total, part| total.checked_add(*part))
        .ok_or(DomainError::BuildOutOfRange(what))
}

fn checked_product(unit: i64, count: u32, what: &'static str) -> Result<i64, DomainError> {
    unit.checked_mul(i64::from(count)).ok_or(DomainError::BuildOutOfRange(what))
}

pub async fn build<C>(
    catalog: &C,
    profile: &EngineeringProfile,
    request: &LoadRequest,
) -> Result<CustomBuildRecommendation, ApplicationError>
where
    C: CatalogRepository + ?Sized,
{
    let load = profile.engineer(request);

    if let Some(package) = catalog
        .find_bundled_package(load.inverter_watts, load.required_kwh, load.system_voltage)
        .await?
    {
        return Ok(from_bundle(package));
    }

    let (inverter_name, inverter_kw, inverter_price) = match catalog
        .find_inverter(load.inverter_watts, load.system_voltage, load.charge_amps)
        .await?
    {
        Some(row) => (row.display_name(), f64::from(row.rated_watts) / 1000.0, row.price),
        None => (
            "Industrial / parallel inverter stack".to_string(),
            load.inverter_watts / 1000.0,
            whole_kyat(
                load.inverter_watts * profile.synthetic_inverter_price_per_watt,
                "inverter price",
            )?,
        ),
    };

    let band = VoltageRange::around(
        load.system_voltage,
        profile.battery_band_low,
        profile.battery_band_high,
    );
    let (battery_model, unit_kwh, unit_price) =
        match catalog.find_battery(band, &profile.battery_chemistry).await? {
            Some(row) if row.capacity_kwh > 0.0 => {
                (row.display_name(), row.capacity_kwh, row.price)
            }
            _ => (
                format!("Generic {} module", profile.battery_chemistry),
                profile.synthetic_battery_unit_kwh,
                whole_kyat(
                    profile.synthetic_battery_unit_kwh * profile.synthetic_battery_price_per_kwh,
                    "battery price",
                )?,
            ),
        };
    let battery_qty = ceil_ratio(load.required_kwh, unit_kwh)
        .ok_or(DomainError::BuildOutOfRange("battery count"))?
        .max(1);
    let total_storage_kwh = f64::from(battery_qty) * unit_kwh;

    let install = catalog
        .find_install_cost_ref(load.system_voltage)
        .await?
        .unwrap_or_else(|| InstallCostRef {
            system_voltage: load.system_voltage,
            ..profile.default_install.clone()
        });

    let solar_panel_count = if request.no_solar() {
        0
    } else {
        profile
            .panel_count(request.raw_kwh())
            .ok_or(DomainError::BuildOutOfRange("panel count"))?
    };

    let equipment_cost = checked_sum(
        &[inverter_price, checked_product(unit_price, battery_qty, "battery bank cost")?],
        "equipment cost",
    )?;
    let solar_cost = checked_product(profile.panel_price, solar_panel_count, "solar cost")?;
    let cabinet = if profile.needs_cabinet(battery_qty, total_storage_kwh) {
        install.cabinet_cost
    } else {
        0
    };
    let installation_cost = checked_sum(
        &[
            install.labor_cost,
            install.accessories_cost,
            checked_product(install.mounting_per_panel, solar_panel_count, "mounting cost")?,
            cabinet,
        ],
        "installation cost",
    )?;
    let total_estimate =
        checked_sum(&[equipment_cost, solar_cost, installation_cost], "total estimate")?;

    Ok(CustomBuildRecommendation {
        source: BuildSource::Components,
        inverter_name,
        inverter_kw,
        system_voltage: load.system_voltage,
        battery_model,
        battery_qty,
        total_storage_kwh,
        solar_panel_count,
        equipment_cost,
        solar_cost,
        installation_cost,
        total_estimate,
    })
}

fn from_bundle(package: PackageRow) -> CustomBuildRecommendation {
    CustomBuildRecommendation {
        source: BuildSource::Bundled,
        inverter_name: package.name.clone(),
        inverter_kw: package.inverter_kw,
        system_voltage: package.system_voltage,
        battery_model: format!("{} battery bank", package.name),
        battery_qty: 1,
        total_storage_kwh: package.battery_kwh,
        solar_panel_count: 0,
        equipment_cost: package.est_price_low,
        solar_cost: 0,
        installation_cost: package.install_cost,
        total_estimate: package.est_price_low + package.install_cost,
    }
}
