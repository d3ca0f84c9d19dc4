use serde::{Deserialize, Serialize};

use super::catalog::Tier;

pub const UNSERVICEABLE_REASON: &str = "load exceeds residential catalog coverage";

/// Outcome of sizing one load request. Each variant is fully populated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SizingDecision {
    Portable(PortableRecommendation),
    HomeInstall(HomeInstallRecommendation),
    CustomBuild(CustomBuildRecommendation),
    Unserviceable { reason: String },
}

impl SizingDecision {
    pub fn unserviceable() -> Self {
        Self::Unserviceable { reason: UNSERVICEABLE_REASON.to_string() }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Portable(_) => "portable",
            Self::HomeInstall(_) => "home_install",
            Self::CustomBuild(_) => "custom_build",
            Self::Unserviceable { .. } => "unserviceable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortableRecommendation {
    pub tier_name: String,
    pub specs_summary: String,
    pub price_estimate: i64,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomeInstallRecommendation {
    pub tier: Tier,
    pub tier_name: String,
    pub voltage: u32,
    pub inverter_spec: String,
    pub battery_spec: String,
    pub price_range_low: i64,
    pub price_range_high: i64,
    pub install_fee: i64,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSource {
    /// A single in-market package covers the engineered minimums.
    Bundled,
    /// Assembled line by line from component rows or synthetic fallbacks.
    Components,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomBuildRecommendation {
    pub source: BuildSource,
    pub inverter_name: String,
    pub inverter_kw: f64,
    pub system_voltage: u32,
    pub battery_model: String,
    pub battery_qty: u32,
    pub total_storage_kwh: f64,
    pub solar_panel_count: u32,
    pub equipment_cost: i64,
    pub solar_cost: i64,
    pub installation_cost: i64,
    pub total_estimate: i64,
}
