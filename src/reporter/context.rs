use super::job::JobKind;
use super::retry_policy::{JobPolicies, JobPolicy};
use crate::clock::Clock;
use crate::config::{AppConfig, SinkPaths};
use crate::gateway::CrmGateway;
use crate::sink::LogSink;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::sync::Arc;

/// Context provided to jobs during execution.
///
/// Holds the backend gateway, the clock and the resolved configuration.
/// Everything is immutable, so clones can run jobs concurrently.
#[derive(Clone)]
pub struct JobContext {
    /// Access to the CRM GraphQL backend.
    pub gateway: Arc<dyn CrmGateway>,

    /// Source of "now" for timestamps and reminder windows.
    pub clock: Arc<dyn Clock>,

    pub sinks: SinkPaths,
    pub policies: JobPolicies,
    pub heartbeat_subject: String,
}

impl JobContext {
    /// Create a new job context with the given dependencies.
    pub fn new(gateway: Arc<dyn CrmGateway>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self {
            gateway,
            clock,
            sinks: config.sinks.clone(),
            policies: config.policies.clone(),
            heartbeat_subject: config.heartbeat_subject.clone(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn sink(&self, kind: JobKind) -> LogSink {
        LogSink::new(self.sinks.for_kind(kind))
    }

    pub fn policy(&self, kind: JobKind) -> &JobPolicy {
        self.policies.for_kind(kind)
    }

    /// Current time formatted for the given job's log lines.
    pub fn timestamp(&self, kind: JobKind) -> String {
        format_timestamp(kind, self.now())
    }
}

pub(crate) fn format_timestamp(kind: JobKind, now: DateTime<Utc>) -> String {
    match kind.timestamp_format() {
        Some(format) => now.with_timezone(&Local).format(format).to_string(),
        None => now.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}
