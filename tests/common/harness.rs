//! Reporter wired to a fake CRM with its own temporary log directory.

use super::fake_crm::FakeCrm;
use crm_reporter::config::{CliConfig, FileConfig};
use crm_reporter::{AppConfig, JobKind, Reporter};
use std::path::Path;
use tempfile::TempDir;

/// No backoff between retries so failure tests stay fast.
const FAST_RETRY_CONFIG: &str = r#"
heartbeat_subject = "CRM"

[jobs.heartbeat]
initial_backoff_ms = 0

[jobs.low_stock]
initial_backoff_ms = 0

[jobs.weekly_report]
initial_backoff_ms = 0

[jobs.order_reminders]
initial_backoff_ms = 0
"#;

pub struct TestReporter {
    pub reporter: Reporter,
    pub config: AppConfig,
    log_dir: TempDir,
}

impl TestReporter {
    pub fn new(crm: &FakeCrm) -> Self {
        Self::with_url(&crm.graphql_url)
    }

    /// Reporter pointed at an arbitrary endpoint.
    pub fn with_url(graphql_url: &str) -> Self {
        let log_dir = TempDir::new().expect("Failed to create log dir");

        let config_path = log_dir.path().join("reporter.toml");
        std::fs::write(&config_path, FAST_RETRY_CONFIG).expect("Failed to write config");
        let file_config = FileConfig::load(&config_path).expect("Failed to load config");

        let cli = CliConfig {
            graphql_url: Some(graphql_url.to_string()),
            log_dir: Some(log_dir.path().to_path_buf()),
        };
        let config = AppConfig::resolve(&cli, Some(file_config)).expect("Invalid config");
        let reporter = Reporter::new(&config).expect("Failed to create reporter");

        Self {
            reporter,
            config,
            log_dir,
        }
    }

    pub fn log_dir(&self) -> &Path {
        self.log_dir.path()
    }

    /// Lines appended so far to the given job's log.
    pub fn lines(&self, kind: JobKind) -> Vec<String> {
        std::fs::read_to_string(self.config.sinks.for_kind(kind))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
