use serde::Serialize;
use stocktalk_core::config::{AppConfig, LoadOptions};
use stocktalk_db::{connect_with_config, migrations, ping, DbPool};

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
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
        let (overall_status, summary) = if all_pass {
            (CheckStatus::Pass, "doctor: all readiness checks passed")
        } else {
            (CheckStatus::Fail, "doctor: one or more readiness checks failed")
        };
        Self { overall_status, summary: summary.to_string(), checks }
    }
}

pub fn run(json_output: bool) -> String {
    let report = DoctorReport::from_checks(collect_checks());

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

fn collect_checks() -> Vec<DoctorCheck> {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let reason = "configuration did not load";
            return vec![
                DoctorCheck::fail("config_validation", error.to_string()),
                DoctorCheck::skipped("model_settings", reason),
                DoctorCheck::skipped("database_connectivity", reason),
                DoctorCheck::skipped("schema_migrations", reason),
            ];
        }
    };

    let mut checks = vec![
        DoctorCheck::pass("config_validation", "configuration loaded and validated"),
        model_settings(&config),
    ];
    checks.extend(database_checks(&config));
    checks
}

/// Settings only; no request is sent to the model endpoint.
fn model_settings(config: &AppConfig) -> DoctorCheck {
    DoctorCheck::pass(
        "model_settings",
        format!(
            "model `{}` at {} ({}s timeout, up to {} retries)",
            config.llm.model, config.llm.base_url, config.llm.timeout_secs, config.llm.max_retries
        ),
    )
}

fn database_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("schema_migrations", "the database was not reachable"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("schema_migrations", "the database was not reachable"),
                ];
            }
        };

        let checks = match ping(&pool).await {
            Ok(()) => vec![
                DoctorCheck::pass(
                    "database_connectivity",
                    format!("connected using `{}`", config.database.url),
                ),
                schema_migrations(&pool).await,
            ],
            Err(error) => vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("database probe failed: {error}"),
                ),
                DoctorCheck::skipped("schema_migrations", "the database was not reachable"),
            ],
        };
        pool.close().await;
        checks
    })
}

async fn schema_migrations(pool: &DbPool) -> DoctorCheck {
    match migrations::status(pool).await {
        Ok(status) => {
            let summary = format!("{} of {} migrations applied", status.applied, status.expected);
            if status.is_current() {
                return DoctorCheck::pass("schema_migrations", summary);
            }
            DoctorCheck::fail("schema_migrations", format!("{summary}; run `stocktalk migrate`"))
        }
        Err(error) => DoctorCheck::fail("schema_migrations", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

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
