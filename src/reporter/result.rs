//! Values produced by a job run.

use crate::gateway::GatewayError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a job run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Network failure that persisted through every retry.
    TransientNetworkError,
    /// None of the accepted response shapes matched.
    SchemaShapeMismatch,
    /// The backend rejected the request (GraphQL errors, 4xx).
    CollaboratorError,
    /// The backend answered with something that is not a GraphQL response.
    InvalidResponse,
    /// The log sink could not be written.
    SinkWriteError,
    /// The job was invoked with an unusable argument.
    InvalidInput,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TransientNetworkError => "TransientNetworkError",
            FailureKind::SchemaShapeMismatch => "SchemaShapeMismatch",
            FailureKind::CollaboratorError => "CollaboratorError",
            FailureKind::InvalidResponse => "InvalidResponse",
            FailureKind::SinkWriteError => "SinkWriteError",
            FailureKind::InvalidInput => "InvalidInput",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified failure with its detail message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl From<GatewayError> for JobFailure {
    fn from(error: GatewayError) -> Self {
        let kind = match &error {
            e if e.is_retryable() => FailureKind::TransientNetworkError,
            GatewayError::InvalidResponse(_) => FailureKind::InvalidResponse,
            _ => FailureKind::CollaboratorError,
        };
        JobFailure::new(kind, error.to_string())
    }
}

/// A product's stock level after replenishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub name: String,
    pub stock_after_update: u64,
}

/// Aggregate business metrics fetched for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub customer_count: u64,
    pub order_count: u64,
    pub revenue_total: f64,
    pub low_stock_items: Vec<StockLevel>,
}

/// An order that falls inside the reminder window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReminder {
    pub id: String,
    pub customer_email: Option<String>,
    pub order_date: DateTime<Utc>,
}

/// Outcome of the heartbeat's GraphQL probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    NoHello,
    Failed { kind: FailureKind, detail: String },
}

impl ProbeStatus {
    /// Annotation appended to the heartbeat line.
    pub fn annotation(&self) -> String {
        match self {
            ProbeStatus::Ok => "GraphQL hello OK".to_string(),
            ProbeStatus::NoHello => "GraphQL responded, but no hello".to_string(),
            ProbeStatus::Failed { kind, detail } => format!("GraphQL error: {}: {}", kind, detail),
        }
    }
}

/// Job-specific payload of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobOutput {
    Heartbeat {
        probe: ProbeStatus,
    },
    Replenishment {
        message: String,
        items: Vec<StockLevel>,
    },
    Report(MetricsSnapshot),
    Reminders {
        shape: &'static str,
        orders: Vec<OrderReminder>,
    },
}

/// Result of one job invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobResult {
    Success(JobOutput),
    Failure(JobFailure),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success(_))
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            JobResult::Success(_) => None,
            JobResult::Failure(failure) => Some(failure),
        }
    }

    pub fn output(&self) -> Option<&JobOutput> {
        match self {
            JobResult::Success(output) => Some(output),
            JobResult::Failure(_) => None,
        }
    }
}
