// Installed app state records

use crate::config;
use crate::constants::METHOD_DIGEST;
use crate::verify::VerificationContext;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// On-disk record for one installed app (apps/<name>.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub version: String,
    pub original_tag_name: String,
    /// AppImage filename inside the apps directory.
    pub appimage: String,
    /// SHA-256 of the installed file, for later health checks.
    pub sha256: String,
    pub installed_at: DateTime<Utc>,
    pub verification: VerificationRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: MethodStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Verification outcome persisted with the app.
///
/// Current records use the `methods` list; records written by earlier
/// versions used a single-method mapping ({"digest": {...}}) and must
/// keep loading as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationRecord {
    Methods {
        methods: Vec<MethodRecord>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Legacy(BTreeMap<String, serde_json::Value>),
}

impl VerificationRecord {
    /// Build the persisted record from a completed verification run.
    pub fn from_context(ctx: &VerificationContext) -> Self {
        let methods: Vec<MethodRecord> = ctx
            .verification_methods
            .iter()
            .map(|(key, result)| MethodRecord {
                kind: key.to_string(),
                status: if result.passed {
                    MethodStatus::Passed
                } else {
                    MethodStatus::Failed
                },
                algorithm: result.hash_type.map(|a| a.name().to_string()),
                source: result
                    .url
                    .clone()
                    .or_else(|| (*key == METHOD_DIGEST).then(|| "release-api".to_string())),
            })
            .collect();

        let warning = methods
            .is_empty()
            .then(|| "no verification data available for this release".to_string());

        VerificationRecord::Methods { methods, warning }
    }

    pub fn passed(&self) -> bool {
        match self {
            VerificationRecord::Methods { methods, .. } => {
                methods.iter().any(|m| m.status == MethodStatus::Passed)
            }
            VerificationRecord::Legacy(map) => map.values().any(|v| {
                v.get("passed").and_then(|p| p.as_bool()).unwrap_or(false)
                    || v.get("status").and_then(|s| s.as_str()) == Some("passed")
            }),
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            VerificationRecord::Methods { warning, .. } => warning.as_deref(),
            VerificationRecord::Legacy(_) => None,
        }
    }
}

impl AppState {
    pub fn load(name: &str) -> anyhow::Result<Self> {
        let path = config::app_state_path(name);
        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        fs::create_dir_all(config::apps_dir())?;
        let path = config::app_state_path(&self.name);
        let text = serde_json::to_string_pretty(self)?;
        fs::write(&path, text)?;
        Ok(())
    }

    pub fn delete(name: &str) -> anyhow::Result<()> {
        fs::remove_file(config::app_state_path(name))?;
        Ok(())
    }

    /// All installed apps, sorted by name. Unparseable state files are
    /// skipped with a warning.
    pub fn list() -> Vec<AppState> {
        let mut apps = Vec::new();
        let Ok(entries) = fs::read_dir(config::apps_dir()) else {
            return apps;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|text| Ok(serde_json::from_str::<AppState>(&text)?))
            {
                Ok(state) => apps.push(state),
                Err(e) => warn!("Skipping unreadable state file {}: {}", path.display(), e),
            }
        }
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        apps
    }
}
