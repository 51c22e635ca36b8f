//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "storage": { "memoryOnly": false },
//!   "insights": { "recentActivityDays": 7, "recentExpenses": 5 },
//!   "logLevel": "info",
//!   "categories": ["Pets"]
//! }
//! ```
//! Unknown keys are preserved when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_CATEGORIES;

const SETTINGS_FILE: &str = "settings.json";
const MEMORY_ONLY_ENV_VAR: &str = "OUTLAY_MEMORY_ONLY";

const DEFAULT_RECENT_ACTIVITY_DAYS: u32 = 7;
const DEFAULT_RECENT_EXPENSES: usize = 5;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    insights: InsightSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageSettings {
    #[serde(default)]
    memory_only: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightSettings {
    #[serde(default = "default_recent_activity_days")]
    recent_activity_days: u32,
    #[serde(default = "default_recent_expenses")]
    recent_expenses: usize,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            recent_activity_days: DEFAULT_RECENT_ACTIVITY_DAYS,
            recent_expenses: DEFAULT_RECENT_EXPENSES,
            other: HashMap::new(),
        }
    }
}

fn default_recent_activity_days() -> u32 {
    DEFAULT_RECENT_ACTIVITY_DAYS
}

fn default_recent_expenses() -> usize {
    DEFAULT_RECENT_EXPENSES
}

/// Outlay configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Keep expenses in memory only; nothing is written for them
    pub memory_only: bool,
    /// Trailing window for the recent-activity statistic, in days
    pub recent_activity_days: u32,
    /// How many expenses the dashboard lists as recent
    pub recent_expenses: usize,
    pub log_level: Option<String>,
    /// User-defined categories offered alongside the defaults
    pub categories: Vec<String>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Memory-only mode can be enabled via:
    /// 1. Settings file (`storage.memoryOnly`)
    /// 2. Environment variable OUTLAY_MEMORY_ONLY (for CI/testing)
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed {}: {}", SETTINGS_FILE, e);
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_settings(raw);
        if let Some(flag) = parse_flag(std::env::var(MEMORY_ONLY_ENV_VAR).ok().as_deref()) {
            config.memory_only = flag;
        }
        Ok(config)
    }

    /// Save config to the data directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.storage.memory_only = self.memory_only;
        settings.insights.recent_activity_days = self.recent_activity_days;
        settings.insights.recent_expenses = self.recent_expenses;
        settings.log_level = self.log_level.clone();
        settings.categories = self.categories.clone();

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Default categories followed by any user-defined ones
    pub fn category_choices(&self) -> Vec<String> {
        let mut choices: Vec<String> = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        for custom in &self.categories {
            if !choices.contains(custom) {
                choices.push(custom.clone());
            }
        }
        choices
    }

    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            memory_only: raw.storage.memory_only,
            recent_activity_days: raw.insights.recent_activity_days,
            recent_expenses: raw.insights.recent_expenses,
            log_level: raw.log_level.clone(),
            categories: raw.categories.clone(),
            _raw_settings: raw,
        }
    }
}

fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value {
        Some("true" | "1" | "yes" | "TRUE" | "YES") => Some(true),
        Some("false" | "0" | "no" | "FALSE" | "NO") => Some(false),
        _ => None,
    }
}
