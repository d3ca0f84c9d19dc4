use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use meesaya_core::domain::catalog::ProductRow;
use meesaya_core::domain::decision::{
    BuildSource, CustomBuildRecommendation, HomeInstallRecommendation, PortableRecommendation,
    SizingDecision,
};
use meesaya_core::domain::load::{HousingType, LoadRequest};
use meesaya_core::errors::ApplicationError;
use meesaya_core::sizing::SizingEngine;

pub const SEARCH_RESULT_LIMIT: u32 = 4;
pub const SEARCH_HEADER: &str = "INVENTORY SEARCH RESULTS:";
pub const NO_PRODUCTS_FOUND: &str = "No specific products found.";

/// A tool call requested by the model. Unknown tool names never reach this type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolInvocation {
    Calculate {
        watts: f64,
        hours: f64,
        housing: HousingType,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        no_solar: bool,
    },
    Search {
        query: String,
    },
}

impl ToolInvocation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calculate { .. } => "calculate",
            Self::Search { .. } => "search",
        }
    }

    /// Canonical JSON replayed to the model as the assistant's tool turn.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"tool\":\"{}\"}}", self.name()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("invalid tool invocation: {0}")]
    InvalidInvocation(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl From<ApplicationError> for ToolError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(domain) => Self::InvalidInvocation(domain.to_string()),
            other => Self::CatalogUnavailable(other.to_string()),
        }
    }
}

/// Finds a tool call embedded in model output.
///
/// The candidate is the span from the first `{` to the last `}`, so prose
/// around the JSON is tolerated. Anything that does not describe a known tool
/// with its required arguments yields `None`.
pub fn extract_invocation(text: &str) -> Option<ToolInvocation> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    match value.get("tool")?.as_str()? {
        "calculate" => Some(ToolInvocation::Calculate {
            watts: number_field(&value, "watts")?,
            hours: number_field(&value, "hours")?,
            housing: value
                .get("housing")
                .and_then(Value::as_str)
                .map(HousingType::parse_lenient)
                .unwrap_or_default(),
            no_solar: value.get("no_solar").and_then(Value::as_bool).unwrap_or(false),
        }),
        "search" => Some(ToolInvocation::Search {
            query: value.get("query")?.as_str()?.to_string(),
        }),
        _ => None,
    }
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

/// Executes tool invocations against the sizing engine and its catalog.
#[derive(Clone)]
pub struct ToolDispatcher {
    engine: SizingEngine,
}

impl ToolDispatcher {
    pub fn new(engine: SizingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SizingEngine {
        &self.engine
    }

    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        match invocation {
            ToolInvocation::Calculate { watts, hours, housing, no_solar } => {
                let request = LoadRequest::new(*watts, *hours, *housing, *no_solar)
                    .map_err(|error| ToolError::InvalidInvocation(error.to_string()))?;
                let decision = self.engine.size(&request).await?;
                debug!(
                    event_name = "tool.calculate",
                    strategy = decision.strategy(),
                    watts = *watts,
                    hours = *hours,
                    housing = %housing,
                    "sizing decision rendered"
                );
                Ok(render_decision(&decision))
            }
            ToolInvocation::Search { query } => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(ToolError::InvalidInvocation("search query is empty".to_string()));
                }

                let catalog = self.engine.catalog();
                let lines = match catalog.search_products(query, SEARCH_RESULT_LIMIT).await {
                    Ok(rows) if rows.is_empty() => vec![NO_PRODUCTS_FOUND.to_string()],
                    Ok(rows) => rows.iter().map(render_product).collect(),
                    Err(error) => {
                        warn!(event_name = "tool.search", error = %error, "product search failed");
                        vec![format!("Search Error: {error}")]
                    }
                };
                Ok(format!("{SEARCH_HEADER}\n{}", lines.join("\n")))
            }
        }
    }
}

pub fn render_decision(decision: &SizingDecision) -> String {
    match decision {
        SizingDecision::Portable(portable) => render_portable(portable),
        SizingDecision::HomeInstall(home) => render_home_install(home),
        SizingDecision::CustomBuild(build) => render_custom_build(build),
        SizingDecision::Unserviceable { reason } => format!("Error: {reason}"),
    }
}

fn render_portable(portable: &PortableRecommendation) -> String {
    format!(
        "RECOMMENDATION: {} (Portable)\nSPECS: {}\nPRICE: {} MMK",
        portable.tier_name,
        portable.specs_summary,
        format_mmk(portable.price_estimate)
    )
}

fn render_home_install(home: &HomeInstallRecommendation) -> String {
    format!(
        "RECOMMENDATION: {}\n\
         SPECS: {} + {}\n\
         VOLTAGE: {}V System\n\
         ESTIMATED PRICE: {} - {} MMK (Includes {} MMK Installation)\n\
         CAPABILITY: {}",
        home.tier_name,
        home.inverter_spec,
        home.battery_spec,
        home.voltage,
        format_mmk(home.price_range_low),
        format_mmk(home.price_range_high),
        format_mmk(home.install_fee),
        home.description
    )
}

fn render_custom_build(build: &CustomBuildRecommendation) -> String {
    let kind = match build.source {
        BuildSource::Bundled => "Bundled Package",
        BuildSource::Components => "Custom Build",
    };
    let solar = if build.solar_panel_count == 0 {
        "None (grid charging only)".to_string()
    } else {
        format!("{} panels ({} MMK)", build.solar_panel_count, format_mmk(build.solar_cost))
    };

    format!(
        "RECOMMENDATION: {kind}\n\
         INVERTER: {} ({}kW)\n\
         VOLTAGE: {}V System\n\
         BATTERY: {} x {} ({}kWh total)\n\
         SOLAR: {solar}\n\
         EQUIPMENT: {} MMK\n\
         INSTALLATION: {} MMK\n\
         ESTIMATED PRICE: {} MMK",
        build.inverter_name,
        round_hundredths(build.inverter_kw),
        build.system_voltage,
        build.battery_qty,
        build.battery_model,
        round_hundredths(build.total_storage_kwh),
        format_mmk(build.equipment_cost),
        format_mmk(build.installation_cost),
        format_mmk(build.total_estimate)
    )
}

fn render_product(row: &ProductRow) -> String {
    format!(
        "{}: {} {} ({}) - {} MMK [{}]",
        row.category,
        row.brand,
        row.model,
        row.specs,
        format_mmk(row.price),
        row.tags
    )
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a kyat amount with comma thousands separators.
pub fn format_mmk(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
