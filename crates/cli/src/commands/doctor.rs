use meesaya_core::config::{AppConfig, LoadOptions};
use meesaya_db::{connect_from_config, ping, SeedDataset};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self::new(name, CheckStatus::Skipped, format!("skipped because {reason}"))
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::new(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ));
            checks.push(check_telegram_token(&config));
            checks.push(check_llm_key(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            let reason = "configuration did not load";
            checks.push(DoctorCheck::new("config_validation", CheckStatus::Fail, error.to_string()));
            checks.push(DoctorCheck::skipped("telegram_token_readiness", reason));
            checks.push(DoctorCheck::skipped("llm_key_readiness", reason));
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("catalog_seeded", reason));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_telegram_token(config: &AppConfig) -> DoctorCheck {
    if config.telegram.is_configured() {
        let details = match &config.telegram.public_url {
            Some(url) => format!("bot token present, webhook target `{url}/webhook`"),
            None => "bot token present, webhook registration disabled".to_string(),
        };
        DoctorCheck::new("telegram_token_readiness", CheckStatus::Pass, details)
    } else {
        DoctorCheck::new(
            "telegram_token_readiness",
            CheckStatus::Fail,
            "set MEESAYA_TELEGRAM_BOT_TOKEN or telegram.bot_token",
        )
    }
}

fn check_llm_key(config: &AppConfig) -> DoctorCheck {
    if config.llm.api_key.is_some() {
        DoctorCheck::new(
            "llm_key_readiness",
            CheckStatus::Pass,
            format!("api key present for model `{}`", config.llm.model),
        )
    } else {
        DoctorCheck::new(
            "llm_key_readiness",
            CheckStatus::Fail,
            "set MEESAYA_LLM_API_KEY or llm.api_key",
        )
    }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::new(
                    "database_connectivity",
                    CheckStatus::Fail,
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("catalog_seeded", "the database was not reachable"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_from_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::new(
                        "database_connectivity",
                        CheckStatus::Fail,
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("catalog_seeded", "the database was not reachable"),
                ];
            }
        };

        let mut checks = Vec::new();
        match ping(&pool).await {
            Ok(()) => checks.push(DoctorCheck::new(
                "database_connectivity",
                CheckStatus::Pass,
                format!("connected using `{}`", config.database.url),
            )),
            Err(error) => checks.push(DoctorCheck::new(
                "database_connectivity",
                CheckStatus::Fail,
                format!("database query failed: {error}"),
            )),
        }

        let seeded = match SeedDataset::verify(&pool).await {
            Ok(verification) if verification.all_present => DoctorCheck::new(
                "catalog_seeded",
                CheckStatus::Pass,
                "packages, components and install references present",
            ),
            Ok(verification) => {
                let missing = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                DoctorCheck::new(
                    "catalog_seeded",
                    CheckStatus::Fail,
                    format!("run `meesaya seed`; missing: {}", missing.join(", ")),
                )
            }
            Err(error) => DoctorCheck::new(
                "catalog_seeded",
                CheckStatus::Fail,
                format!("catalog tables unreadable (run `meesaya migrate`): {error}"),
            ),
        };
        checks.push(seeded);

        pool.close().await;
        checks
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
