mod file_config;

pub use file_config::{FileConfig, JobPolicyConfig, JobsConfig, SinksConfig};

use crate::reporter::{JobKind, JobPolicies, JobPolicy};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GRAPHQL_URL: &str = "http://127.0.0.1:8000/graphql";
pub const DEFAULT_LOG_DIR: &str = "/tmp";
pub const DEFAULT_HEARTBEAT_SUBJECT: &str = "CRM";
pub const DEFAULT_LOW_STOCK_INCREMENT: u32 = 10;
pub const DEFAULT_REMINDER_LOOKBACK_DAYS: u32 = 7;
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub graphql_url: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub graphql_url: String,
    pub heartbeat_subject: String,
    pub low_stock_increment: u32,
    pub reminder_lookback_days: u32,

    pub sinks: SinkPaths,
    pub policies: JobPolicies,
}

/// Where each job appends its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkPaths {
    pub heartbeat: PathBuf,
    pub low_stock: PathBuf,
    pub weekly_report: PathBuf,
    pub order_reminders: PathBuf,
}

impl SinkPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            heartbeat: dir.join(JobKind::Heartbeat.default_sink_file()),
            low_stock: dir.join(JobKind::LowStock.default_sink_file()),
            weekly_report: dir.join(JobKind::WeeklyReport.default_sink_file()),
            order_reminders: dir.join(JobKind::OrderReminders.default_sink_file()),
        }
    }

    pub fn for_kind(&self, kind: JobKind) -> &PathBuf {
        match kind {
            JobKind::Heartbeat => &self.heartbeat,
            JobKind::LowStock => &self.low_stock,
            JobKind::WeeklyReport => &self.weekly_report,
            JobKind::OrderReminders => &self.order_reminders,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let graphql_url = file
            .graphql_url
            .or_else(|| cli.graphql_url.clone())
            .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
        if !(graphql_url.starts_with("http://") || graphql_url.starts_with("https://")) {
            bail!("graphql_url must be an http(s) URL, got {:?}", graphql_url);
        }

        let log_dir = file
            .log_dir
            .map(PathBuf::from)
            .or_else(|| cli.log_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

        // Sink paths - explicit [sinks] entries win over log_dir defaults
        let sinks_file = file.sinks.unwrap_or_default();
        let uses_log_dir = sinks_file.heartbeat.is_none()
            || sinks_file.low_stock.is_none()
            || sinks_file.weekly_report.is_none()
            || sinks_file.order_reminders.is_none();

        // Validate log_dir only when some sink lives there
        if uses_log_dir {
            if !log_dir.exists() {
                bail!("Log directory does not exist: {:?}", log_dir);
            }
            if !log_dir.is_dir() {
                bail!("log_dir is not a directory: {:?}", log_dir);
            }
        }

        let mut sinks = SinkPaths::in_dir(&log_dir);
        if let Some(path) = sinks_file.heartbeat {
            sinks.heartbeat = PathBuf::from(path);
        }
        if let Some(path) = sinks_file.low_stock {
            sinks.low_stock = PathBuf::from(path);
        }
        if let Some(path) = sinks_file.weekly_report {
            sinks.weekly_report = PathBuf::from(path);
        }
        if let Some(path) = sinks_file.order_reminders {
            sinks.order_reminders = PathBuf::from(path);
        }

        let heartbeat_subject = file
            .heartbeat_subject
            .unwrap_or_else(|| DEFAULT_HEARTBEAT_SUBJECT.to_string());

        let low_stock_increment = file
            .low_stock_increment
            .unwrap_or(DEFAULT_LOW_STOCK_INCREMENT);
        if low_stock_increment == 0 {
            bail!("low_stock_increment must be positive");
        }

        let reminder_lookback_days = file
            .reminder_lookback_days
            .unwrap_or(DEFAULT_REMINDER_LOOKBACK_DAYS);
        if reminder_lookback_days == 0 {
            bail!("reminder_lookback_days must be positive");
        }

        // Job policies - merge file config with per-job defaults
        let jobs_file = file.jobs.unwrap_or_default();
        let mut policies = JobPolicies::default();
        for (kind, overrides) in [
            (JobKind::Heartbeat, jobs_file.heartbeat),
            (JobKind::LowStock, jobs_file.low_stock),
            (JobKind::WeeklyReport, jobs_file.weekly_report),
            (JobKind::OrderReminders, jobs_file.order_reminders),
        ] {
            if let Some(overrides) = overrides {
                apply_policy_overrides(kind, policies.for_kind_mut(kind), overrides)?;
            }
        }

        Ok(Self {
            graphql_url,
            heartbeat_subject,
            low_stock_increment,
            reminder_lookback_days,
            sinks,
            policies,
        })
    }
}

fn apply_policy_overrides(
    kind: JobKind,
    policy: &mut JobPolicy,
    overrides: JobPolicyConfig,
) -> Result<()> {
    if let Some(timeout_ms) = overrides.timeout_ms {
        if timeout_ms == 0 {
            bail!("jobs.{}.timeout_ms must be positive", kind.id());
        }
        policy.timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(max_retries) = overrides.max_retries {
        if max_retries > MAX_RETRIES_LIMIT {
            bail!(
                "jobs.{}.max_retries must be at most {}",
                kind.id(),
                MAX_RETRIES_LIMIT
            );
        }
        policy.retry.max_retries = max_retries;
    }
    if let Some(verify_tls) = overrides.verify_tls {
        policy.verify_tls = verify_tls;
    }
    if let Some(initial_backoff_ms) = overrides.initial_backoff_ms {
        policy.retry.initial_backoff_ms = initial_backoff_ms;
    }
    if let Some(max_backoff_ms) = overrides.max_backoff_ms {
        policy.retry.max_backoff_ms = max_backoff_ms;
    }
    if let Some(multiplier) = overrides.backoff_multiplier {
        if !(multiplier.is_finite() && multiplier >= 1.0) {
            bail!("jobs.{}.backoff_multiplier must be >= 1.0", kind.id());
        }
        policy.retry.backoff_multiplier = multiplier;
    }
    Ok(())
}
