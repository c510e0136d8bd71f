use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Tunables for the simulated model and storage latencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub model_warmup_ms: u64,
    pub store_warmup_ms: u64,
    pub analysis_delay_ms: u64,
    pub save_delay_ms: u64,
    pub history_delay_ms: u64,
    pub statistics_delay_ms: u64,
    pub delete_delay_ms: u64,
    pub history_limit: usize,
    pub storage_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_warmup_ms: 2000,
            store_warmup_ms: 1000,
            analysis_delay_ms: 1500,
            save_delay_ms: 500,
            history_delay_ms: 300,
            statistics_delay_ms: 200,
            delete_delay_ms: 300,
            history_limit: 10,
            storage_key: "fishDrawings".into(),
        }
    }
}

impl Settings {
    /// Every simulated delay zeroed; warm-ups still run but open immediately.
    pub fn instant() -> Self {
        Self {
            model_warmup_ms: 0,
            store_warmup_ms: 0,
            analysis_delay_ms: 0,
            save_delay_ms: 0,
            history_delay_ms: 0,
            statistics_delay_ms: 0,
            delete_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Applies `FISHPAD_FAST=1` (or `true`) from the environment.
    pub fn with_env_overrides(self) -> Self {
        let fast = std::env::var("FISHPAD_FAST")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if fast {
            Self {
                history_limit: self.history_limit,
                storage_key: self.storage_key,
                ..Self::instant()
            }
        } else {
            self
        }
    }

    pub fn model_warmup(&self) -> Duration {
        Duration::from_millis(self.model_warmup_ms)
    }

    pub fn store_warmup(&self) -> Duration {
        Duration::from_millis(self.store_warmup_ms)
    }

    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }
}

/// JSON-file backed settings with in-memory copy.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("Ignoring malformed settings at {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Settings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
