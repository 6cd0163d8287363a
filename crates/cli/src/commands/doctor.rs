use std::fs;

use serde::Serialize;
use serde_json::Value;
use showroom_core::config::{AppConfig, LoadOptions};
use showroom_db::connect_with_config;

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
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database_connectivity(&config));
            checks.push(check_catalog_index(&config));
            checks.push(check_whatsapp_api(&config));
            checks.push(check_smtp_relay(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_connectivity", "catalog_index", "whatsapp_api", "smtp_relay"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Optional integrations report `skipped` without failing the run.
    let healthy = checks.iter().all(|check| check.status != CheckStatus::Fail)
        && checks.first().is_some_and(|check| check.status == CheckStatus::Pass);
    let overall_status = if healthy { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if healthy {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

/// The index is produced by the external indexing pipeline; its absence only
/// means search returns nothing yet.
fn check_catalog_index(config: &AppConfig) -> DoctorCheck {
    let path = &config.catalog.index_path;
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            return DoctorCheck {
                name: "catalog_index",
                status: CheckStatus::Skipped,
                details: format!("no catalog index at `{}`", path.display()),
            };
        }
    };

    let products = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => Some(items.len()),
        Ok(Value::Object(map)) => map.get("items").and_then(Value::as_array).map(Vec::len),
        _ => None,
    };

    match products {
        Some(count) => DoctorCheck {
            name: "catalog_index",
            status: CheckStatus::Pass,
            details: format!("{count} products in `{}`", path.display()),
        },
        None => DoctorCheck {
            name: "catalog_index",
            status: CheckStatus::Fail,
            details: format!("`{}` is not a catalog index", path.display()),
        },
    }
}

fn check_whatsapp_api(config: &AppConfig) -> DoctorCheck {
    match config.whatsapp.credentials() {
        Some((_, phone_number_id)) => DoctorCheck {
            name: "whatsapp_api",
            status: CheckStatus::Pass,
            details: format!("Cloud API configured for phone number id `{phone_number_id}`"),
        },
        None => DoctorCheck {
            name: "whatsapp_api",
            status: CheckStatus::Skipped,
            details: "whatsapp.token not set; sharing falls back to wa.me links".to_string(),
        },
    }
}

fn check_smtp_relay(config: &AppConfig) -> DoctorCheck {
    match config.smtp.relay() {
        Some((host, from)) => DoctorCheck {
            name: "smtp_relay",
            status: CheckStatus::Pass,
            details: format!(
                "mail relay `{host}:{}` ({:?}) sending as `{from}`",
                config.smtp.port, config.smtp.security
            ),
        },
        None => DoctorCheck {
            name: "smtp_relay",
            status: CheckStatus::Skipped,
            details: "smtp.host not set; email sharing falls back to compose links".to_string(),
        },
    }
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
