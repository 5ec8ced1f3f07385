// Doctor command for health checking the install directory

use crate::config::{self, Config};
use crate::constants;
use crate::state::AppState;
use crate::ui;
use crate::verify::{HashAlgorithm, Verifier};
use serde::Serialize;
use std::fs;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    /// Schema version for the JSON output format.
    /// See constants::SCHEMA_VERSION for the current version.
    schema_version: u32,
    status: String,
    summary: Summary,
    checks: Vec<CheckResult>,
}

#[derive(Debug, Serialize)]
struct Summary {
    ok: usize,
    warnings: usize,
    errors: usize,
}

/// Exit codes: 0 = healthy, 1 = warnings only, 2 = errors present.
pub async fn doctor(json: bool) -> anyhow::Result<i32> {
    let config = Config::load();
    let mut checks = Vec::new();

    if !json {
        ui::header("Checking installed apps...");
    }

    let apps_dir = config::apps_dir();
    if !apps_dir.exists() {
        checks.push(CheckResult {
            name: "apps directory".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist (nothing installed)", apps_dir.display()),
        });
    } else {
        for entry in fs::read_dir(&apps_dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            checks.push(check_app(&name, &config).await);
        }
        if checks.is_empty() {
            checks.push(CheckResult {
                name: "apps directory".to_string(),
                status: CheckStatus::Ok,
                message: "no apps installed".to_string(),
            });
        }
    }

    let summary = Summary {
        ok: checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::Ok))
            .count(),
        warnings: checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::Warning))
            .count(),
        errors: checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::Error))
            .count(),
    };

    let exit_code = if summary.errors > 0 {
        2
    } else if summary.warnings > 0 {
        1
    } else {
        0
    };

    if json {
        let output = DoctorOutput {
            schema_version: constants::SCHEMA_VERSION,
            status: match exit_code {
                0 => "healthy".to_string(),
                1 => "warnings".to_string(),
                _ => "errors".to_string(),
            },
            summary,
            checks,
        };
        ui::line(&serde_json::to_string_pretty(&output)?);
    } else {
        for check in &checks {
            match check.status {
                CheckStatus::Ok => ui::success(&format!("{}: {}", check.name, check.message)),
                CheckStatus::Warning => ui::warning(&format!("{}: {}", check.name, check.message)),
                CheckStatus::Error => ui::error(&format!("{}: {}", check.name, check.message)),
            }
        }
        ui::line("");
        ui::line(&format!(
            "{} ok, {} warning(s), {} error(s)",
            summary.ok, summary.warnings, summary.errors
        ));
    }

    Ok(exit_code)
}

async fn check_app(name: &str, config: &Config) -> CheckResult {
    let state = match AppState::load(name) {
        Ok(state) => state,
        Err(e) => {
            return CheckResult {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: format!("state file unreadable: {}", e),
            };
        }
    };

    let appimage_path = config::apps_dir().join(&state.appimage);
    if !appimage_path.exists() {
        return CheckResult {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("{} is missing", state.appimage),
        };
    }

    match Verifier::new(&appimage_path, config.default_algorithm)
        .compute_hash(HashAlgorithm::Sha256)
        .await
    {
        Ok(computed) if computed.eq_ignore_ascii_case(&state.sha256) => {
            let message = if state.verification.warning().is_some() {
                format!("{} intact (installed unverified)", state.version)
            } else {
                format!("{} intact", state.version)
            };
            let status = if state.verification.warning().is_some() {
                CheckStatus::Warning
            } else {
                CheckStatus::Ok
            };
            CheckResult {
                name: name.to_string(),
                status,
                message,
            }
        }
        Ok(_) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("{} has been modified since install", state.appimage),
        },
        Err(e) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("could not hash {}: {}", state.appimage, e),
        },
    }
}
