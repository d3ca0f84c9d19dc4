//! Row shapes returned by catalog lookups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Home-install package buckets, ordered by capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::A, Tier::B, Tier::C, Tier::D];

    pub fn code(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Next tier up; `D` saturates.
    pub fn escalate(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::C,
            Self::C | Self::D => Self::D,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(DomainError::UnknownTier(other.to_string())),
        }
    }
}

/// A market package row. Portable units carry no tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageRow {
    pub tier: Option<Tier>,
    pub name: String,
    pub system_voltage: u32,
    pub inverter_kw: f64,
    pub battery_kwh: f64,
    pub est_price_low: i64,
    pub est_price_high: i64,
    pub install_cost: i64,
    pub description: String,
    pub is_portable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InverterRow {
    pub brand: String,
    pub model: String,
    pub rated_watts: u32,
    pub system_voltage: u32,
    pub max_charge_amps: u32,
    pub price: i64,
}

impl InverterRow {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryRow {
    pub brand: String,
    pub model: String,
    pub chemistry: String,
    pub nominal_voltage: f64,
    pub capacity_kwh: f64,
    pub price: i64,
}

impl BatteryRow {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

/// Labour and hardware costs that scale with the system voltage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCostRef {
    pub system_voltage: u32,
    pub labor_cost: i64,
    pub accessories_cost: i64,
    pub mounting_per_panel: i64,
    pub cabinet_cost: i64,
}

/// An inventory row as surfaced by free-text search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub category: String,
    pub brand: String,
    pub model: String,
    pub specs: String,
    pub price: i64,
    pub warranty_years: u32,
    pub tags: String,
}

/// Inclusive nominal-voltage band used when matching battery modules.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoltageRange {
    pub min: f64,
    pub max: f64,
}

impl VoltageRange {
    pub fn around(system_voltage: u32, low_factor: f64, high_factor: f64) -> Self {
        let nominal = f64::from(system_voltage);
        Self { min: nominal * low_factor, max: nominal * high_factor }
    }

    pub fn contains(&self, voltage: f64) -> bool {
        voltage >= self.min && voltage <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::{Tier, VoltageRange};

    #[test]
    fn tiers_are_ordered_and_escalate_by_one_step() {
        assert!(Tier::A < Tier::B && Tier::B < Tier::C && Tier::C < Tier::D);
        assert_eq!(Tier::A.escalate(), Tier::B);
        assert_eq!(Tier::D.escalate(), Tier::D);
        assert_eq!("c".parse::<Tier>(), Ok(Tier::C));
        assert!("E".parse::<Tier>().is_err());
    }

    #[test]
    fn voltage_band_accepts_lithium_nominal_voltages() {
        let band = VoltageRange::around(48, 0.9, 1.2);

        assert!(band.contains(51.2));
        assert!(band.contains(48.0));
        assert!(!band.contains(25.6));
    }
}
