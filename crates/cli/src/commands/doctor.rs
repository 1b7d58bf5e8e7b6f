use foody_core::config::{AppConfig, LoadOptions, MailProvider};
use foody_db::repositories::{SqlRestaurantCatalog, SqlSuggestionQueue};
use foody_db::{connect_with_settings, ping};
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
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 5] =
    ["database_connectivity", "catalog_readiness", "queue_depth", "mail_readiness", "nlu_readiness"];

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
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.extend(check_database(&config));
            checks.push(check_mail(&config));
            checks.push(check_nlu(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in DEPENDENT_CHECKS {
                checks.push(DoctorCheck::skipped(name, "skipped because configuration did not load"));
            }
        }
    }

    summarize(checks)
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Connectivity, catalog contents and queue depth; one runtime for all three.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            )];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("catalog_readiness", "skipped because database is unreachable"),
                    DoctorCheck::skipped("queue_depth", "skipped because database is unreachable"),
                ];
            }
        };

        let mut checks = Vec::new();
        checks.push(match ping(&pool).await {
            Ok(()) => DoctorCheck::pass(
                "database_connectivity",
                format!("connected using `{}`", config.database.url),
            ),
            Err(error) => {
                DoctorCheck::fail("database_connectivity", format!("database query failed: {error}"))
            }
        });

        let catalog = SqlRestaurantCatalog::new(pool.clone());
        checks.push(match catalog.count_by_cuisine().await {
            Ok(per_cuisine) if per_cuisine.is_empty() => {
                DoctorCheck::fail("catalog_readiness", "restaurant catalog is empty; run `foody seed`")
            }
            Ok(per_cuisine) => {
                let total: u64 = per_cuisine.iter().map(|(_, count)| count).sum();
                let breakdown = per_cuisine
                    .iter()
                    .map(|(cuisine, count)| format!("{cuisine}={count}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                DoctorCheck::pass("catalog_readiness", format!("{total} restaurants ({breakdown})"))
            }
            Err(error) => DoctorCheck::fail(
                "catalog_readiness",
                format!("catalog query failed (run `foody migrate`?): {error}"),
            ),
        });

        let queue = SqlSuggestionQueue::new(pool.clone(), config.queue.max_receive_count);
        checks.push(match queue.stats().await {
            Ok(stats) => DoctorCheck::pass(
                "queue_depth",
                format!(
                    "visible={} in_flight={} dead_lettered={}",
                    stats.visible, stats.in_flight, stats.dead_lettered
                ),
            ),
            Err(error) => DoctorCheck::fail("queue_depth", format!("queue stats failed: {error}")),
        });

        pool.close().await;
        checks
    })
}

fn check_mail(config: &AppConfig) -> DoctorCheck {
    match config.mail.provider {
        MailProvider::Log => DoctorCheck::pass(
            "mail_readiness",
            format!("log provider: emails from `{}` are rendered and logged, not sent", config.mail.sender),
        ),
        MailProvider::Http => DoctorCheck::pass(
            "mail_readiness",
            format!(
                "http provider at `{}` sending as `{}`",
                config.mail.base_url.as_deref().unwrap_or("<unset>"),
                config.mail.sender
            ),
        ),
    }
}

fn check_nlu(config: &AppConfig) -> DoctorCheck {
    if !config.nlu.enabled {
        return DoctorCheck::skipped("nlu_readiness", "nlu disabled; POST /chat answers 503");
    }
    DoctorCheck::pass(
        "nlu_readiness",
        format!(
            "bot `{}` alias `{}` locale `{}` at `{}`",
            config.nlu.bot_id,
            config.nlu.bot_alias_id,
            config.nlu.locale_id,
            config.nlu.base_url.as_deref().unwrap_or("<unset>")
        ),
    )
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

#[cfg(test)]
mod tests {
    use super::{render_human, summarize, CheckStatus, DoctorCheck};

    #[test]
    fn skipped_checks_do_not_fail_the_report() {
        let report = summarize(vec![
            DoctorCheck::pass("config_validation", "ok"),
            DoctorCheck::skipped("nlu_readiness", "disabled"),
        ]);

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert_eq!(
            render_human(&report),
            "doctor: all readiness checks passed\n- [ok] config_validation: ok\n- [skip] nlu_readiness: disabled"
        );
    }

    #[test]
    fn any_failure_fails_the_report() {
        let report = summarize(vec![
            DoctorCheck::pass("config_validation", "ok"),
            DoctorCheck::fail("catalog_readiness", "empty"),
        ]);

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert!(render_human(&report).starts_with("doctor: one or more readiness checks failed"));
    }
}
