use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub graphql_url: Option<String>,
    pub log_dir: Option<String>,
    pub heartbeat_subject: Option<String>,
    pub low_stock_increment: Option<u32>,
    pub reminder_lookback_days: Option<u32>,

    // Feature configs
    pub sinks: Option<SinksConfig>,
    pub jobs: Option<JobsConfig>,
}

/// Explicit sink paths. Jobs without one write to `<log_dir>/<default file>`.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SinksConfig {
    pub heartbeat: Option<String>,
    pub low_stock: Option<String>,
    pub weekly_report: Option<String>,
    pub order_reminders: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobsConfig {
    pub heartbeat: Option<JobPolicyConfig>,
    pub low_stock: Option<JobPolicyConfig>,
    pub weekly_report: Option<JobPolicyConfig>,
    pub order_reminders: Option<JobPolicyConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobPolicyConfig {
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub verify_tls: Option<bool>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
