use super::result::{JobFailure, JobOutput};
use crate::gateway::GraphqlRequest;
use crate::sink::LogLine;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Schedule the external trigger should use for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSchedule {
    /// Run at specific times using cron syntax
    Cron(String),
    /// Run at fixed intervals
    Interval(Duration),
}

impl JobSchedule {
    /// Render the schedule as a crontab expression.
    ///
    /// Intervals are only representable when they evenly divide an hour
    /// (whole minutes) or a day (whole hours).
    pub fn to_cron(&self) -> Option<String> {
        match self {
            JobSchedule::Cron(expr) => Some(expr.clone()),
            JobSchedule::Interval(interval) => {
                let secs = interval.as_secs();
                if secs == 0 || secs % 60 != 0 {
                    return None;
                }
                let minutes = secs / 60;
                if minutes < 60 && 60 % minutes == 0 {
                    return Some(format!("*/{} * * * *", minutes));
                }
                if minutes % 60 == 0 {
                    let hours = minutes / 60;
                    if hours < 24 && 24 % hours == 0 {
                        return Some(format!("0 */{} * * *", hours));
                    }
                    if hours == 24 {
                        return Some("0 0 * * *".to_string());
                    }
                }
                None
            }
        }
    }
}

/// The jobs the reporter knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Heartbeat,
    LowStock,
    WeeklyReport,
    OrderReminders,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Heartbeat,
        JobKind::LowStock,
        JobKind::WeeklyReport,
        JobKind::OrderReminders,
    ];

    /// Unique identifier for this job.
    pub fn id(&self) -> &'static str {
        match self {
            JobKind::Heartbeat => "heartbeat",
            JobKind::LowStock => "low_stock",
            JobKind::WeeklyReport => "weekly_report",
            JobKind::OrderReminders => "order_reminders",
        }
    }

    /// Human-readable name for this job.
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Heartbeat => "CRM Heartbeat",
            JobKind::LowStock => "Low Stock Replenishment",
            JobKind::WeeklyReport => "Weekly CRM Report",
            JobKind::OrderReminders => "Order Reminders",
        }
    }

    /// Description of what this job does.
    pub fn description(&self) -> &'static str {
        match self {
            JobKind::Heartbeat => "Log that the CRM is alive and whether GraphQL answers",
            JobKind::LowStock => "Restock products below the low-stock threshold",
            JobKind::WeeklyReport => "Log customer, order and revenue totals",
            JobKind::OrderReminders => "Log reminders for recent orders",
        }
    }

    /// When the external trigger should run this job.
    pub fn schedule(&self) -> JobSchedule {
        match self {
            JobKind::Heartbeat => JobSchedule::Interval(Duration::from_secs(5 * 60)),
            JobKind::LowStock => JobSchedule::Interval(Duration::from_secs(12 * 60 * 60)),
            // Mondays at 06:00
            JobKind::WeeklyReport => JobSchedule::Cron("0 6 * * 1".to_string()),
            JobKind::OrderReminders => JobSchedule::Cron("0 8 * * *".to_string()),
        }
    }

    /// File name of the sink when only a log directory is configured.
    pub fn default_sink_file(&self) -> &'static str {
        match self {
            JobKind::Heartbeat => "crm_heartbeat_log.txt",
            JobKind::LowStock => "low_stock_updates_log.txt",
            JobKind::WeeklyReport => "crm_report_log.txt",
            JobKind::OrderReminders => "order_reminders_log.txt",
        }
    }

    /// Timestamp format used at the start of each line (local clock).
    /// `None` means RFC 3339 in UTC.
    pub fn timestamp_format(&self) -> Option<&'static str> {
        match self {
            JobKind::Heartbeat => Some("%d/%m/%Y-%H:%M:%S"),
            JobKind::LowStock | JobKind::WeeklyReport => Some("%Y-%m-%d %H:%M:%S"),
            JobKind::OrderReminders => None,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Extracts a job's output from a GraphQL `data` object. `None` means the
/// response does not have the expected shape.
pub type Extractor<T> = Box<dyn Fn(&JsonValue) -> Option<T> + Send + Sync>;

/// One accepted request/response shape for a job.
pub struct QueryCandidate<T> {
    /// Short name of the shape, for logs and results.
    pub label: &'static str,
    pub request: GraphqlRequest,
    pub extract: Extractor<T>,
}

impl<T> QueryCandidate<T> {
    pub fn new(
        label: &'static str,
        request: GraphqlRequest,
        extract: impl Fn(&JsonValue) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            request,
            extract: Box::new(extract),
        }
    }
}

/// A reporting job, run by [`super::Reporter::run`].
///
/// The runner acquires data through the candidates in order, renders the
/// lines, appends them to the job's sink and turns any failure into an
/// `ERROR` line.
pub trait ReportJob: Send + Sync {
    type Output: Send;

    fn kind(&self) -> JobKind;

    /// Accepted query shapes, in order of preference.
    fn candidates(&self) -> Vec<QueryCandidate<Self::Output>>;

    /// Turn an acquisition failure into a regular output.
    ///
    /// Jobs that must always log a normal line (the heartbeat) override this.
    fn recover(&self, _failure: &JobFailure) -> Option<Self::Output> {
        None
    }

    /// Lines appended to the sink for a successful run.
    fn render(&self, output: &Self::Output, timestamp: &str) -> Vec<LogLine>;

    /// Structured result handed back to the caller.
    fn finish(&self, output: Self::Output) -> JobOutput;
}
