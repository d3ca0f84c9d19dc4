use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Largest continuous draw accepted for sizing (1 MW).
pub const MAX_LOAD_WATTS: f64 = 1_000_000.0;
/// Longest backup window accepted for sizing (one week).
pub const MAX_BACKUP_HOURS: f64 = 168.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingType {
    #[default]
    Home,
    Apartment,
    Condo,
    Flat,
}

impl HousingType {
    /// Unrecognised housing strings fall back to a detached home.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "apartment" => Self::Apartment,
            "condo" => Self::Condo,
            "flat" => Self::Flat,
            _ => Self::Home,
        }
    }

    /// Compact dwellings are offered a portable unit before any fixed install.
    pub fn is_compact(self) -> bool {
        matches!(self, Self::Apartment | Self::Condo | Self::Flat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Apartment => "apartment",
            Self::Condo => "condo",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for HousingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    watts: f64,
    hours: f64,
    housing: HousingType,
    no_solar: bool,
}

impl LoadRequest {
    pub fn new(
        watts: f64,
        hours: f64,
        housing: HousingType,
        no_solar: bool,
    ) -> Result<Self, DomainError> {
        ensure_in_range("watts", watts, MAX_LOAD_WATTS)?;
        ensure_in_range("hours", hours, MAX_BACKUP_HOURS)?;
        Ok(Self { watts, hours, housing, no_solar })
    }

    pub fn watts(&self) -> f64 {
        self.watts
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    pub fn housing(&self) -> HousingType {
        self.housing
    }

    pub fn no_solar(&self) -> bool {
        self.no_solar
    }

    /// Continuous draw in kW.
    pub fn raw_kw(&self) -> f64 {
        self.watts / 1000.0
    }

    /// Energy drawn over the backup window in kWh.
    pub fn raw_kwh(&self) -> f64 {
        self.watts * self.hours / 1000.0
    }
}

fn ensure_in_range(field: &'static str, value: f64, max: f64) -> Result<(), DomainError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(DomainError::InvalidLoad { field, value });
    }
    if value > max {
        return Err(DomainError::LoadOutOfRange { field, value, max });
    }
    Ok(())
}
