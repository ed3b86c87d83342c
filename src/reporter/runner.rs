use super::context::JobContext;
use super::job::{JobKind, ReportJob};
use super::jobs::{HeartbeatJob, LowStockJob, OrderRemindersJob, WeeklyReportJob};
use super::result::{FailureKind, JobFailure, JobResult};
use super::retry_policy::JobPolicy;
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::gateway::{GatewayError, GraphqlRequest, HttpGateway};
use crate::sink::LogLine;
use anyhow::Result;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs reporting jobs against the CRM backend.
///
/// Cheap to clone; clones share the gateway and may run jobs concurrently.
#[derive(Clone)]
pub struct Reporter {
    ctx: JobContext,
}

impl Reporter {
    /// Create a reporter talking HTTP to the configured GraphQL endpoint.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let gateway = HttpGateway::new(config.graphql_url.clone())?;
        Ok(Self::with_context(JobContext::new(
            Arc::new(gateway),
            Arc::new(SystemClock),
            config,
        )))
    }

    pub fn with_context(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    /// Append a liveness line, annotated with the GraphQL probe outcome.
    pub async fn run_heartbeat(&self) -> JobResult {
        self.run(&HeartbeatJob::new(self.ctx.heartbeat_subject.clone()))
            .await
    }

    /// Restock every product below the low-stock threshold by `increment_by`.
    pub async fn run_low_stock_replenishment(&self, increment_by: u32) -> JobResult {
        if increment_by == 0 {
            return self.reject(JobKind::LowStock, "increment_by must be positive");
        }
        self.run(&LowStockJob::new(increment_by)).await
    }

    /// Append customer, order and revenue totals.
    pub async fn run_weekly_report(&self) -> JobResult {
        self.run(&WeeklyReportJob).await
    }

    /// Append a reminder for each order of the last `lookback_days` days.
    pub async fn run_order_reminders(&self, lookback_days: u32) -> JobResult {
        if lookback_days == 0 {
            return self.reject(JobKind::OrderReminders, "lookback_days must be positive");
        }
        self.run(&OrderRemindersJob::new(lookback_days, self.ctx.now()))
            .await
    }

    /// Run a job: acquire, render, append. Never fails past this boundary.
    pub async fn run<J: ReportJob>(&self, job: &J) -> JobResult {
        let kind = job.kind();
        let started = Instant::now();
        debug!(job = kind.id(), "Starting job {}", kind.name());

        let (lines, result) = match self.acquire(job).await {
            Ok(output) => self.complete(job, output),
            Err(failure) => match job.recover(&failure) {
                Some(output) => {
                    warn!(job = kind.id(), "Recovered from failure: {}", failure);
                    self.complete(job, output)
                }
                None => {
                    error!(job = kind.id(), "Job failed: {}", failure);
                    let line = error_line(&self.ctx.timestamp(kind), &failure);
                    (vec![line], JobResult::Failure(failure))
                }
            },
        };

        let result = self.append(kind, &lines, result);
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            job = kind.id(),
            success = result.is_success(),
            lines = lines.len(),
            duration_ms,
            "Job finished"
        );
        result
    }

    fn complete<J: ReportJob>(&self, job: &J, output: J::Output) -> (Vec<LogLine>, JobResult) {
        let timestamp = self.ctx.timestamp(job.kind());
        let lines = job.render(&output, &timestamp);
        (lines, JobResult::Success(job.finish(output)))
    }

    fn reject(&self, kind: JobKind, detail: &str) -> JobResult {
        let failure = JobFailure::new(FailureKind::InvalidInput, detail);
        warn!(job = kind.id(), "Rejected job invocation: {}", failure);
        let line = error_line(&self.ctx.timestamp(kind), &failure);
        self.append(kind, &[line], JobResult::Failure(failure))
    }

    /// Write `lines` to the job's sink. A failed write is only reported
    /// through the log; it turns a successful result into a failure.
    fn append(&self, kind: JobKind, lines: &[LogLine], result: JobResult) -> JobResult {
        match self.ctx.sink(kind).append(lines) {
            Ok(()) => result,
            Err(e) => {
                error!(job = kind.id(), "Failed to append to log sink: {}", e);
                match result {
                    JobResult::Success(_) => {
                        JobResult::Failure(JobFailure::new(FailureKind::SinkWriteError, e.to_string()))
                    }
                    failure => failure,
                }
            }
        }
    }

    /// Try each candidate shape in order until one yields an output.
    async fn acquire<J: ReportJob>(&self, job: &J) -> Result<J::Output, JobFailure> {
        let kind = job.kind();
        let policy = self.ctx.policy(kind);
        let candidates = job.candidates();
        let tried = candidates.len();
        let mut last_failure = None;
        let mut shape_mismatch = false;

        for candidate in candidates {
            debug!(job = kind.id(), shape = candidate.label, "Querying backend");
            match self.execute_with_retry(kind, &candidate.request, policy).await {
                Ok(data) => match (candidate.extract)(&data) {
                    Some(output) => return Ok(output),
                    None => {
                        debug!(
                            job = kind.id(),
                            shape = candidate.label,
                            "Response did not match shape"
                        );
                        shape_mismatch = true;
                        last_failure = Some(JobFailure::new(
                            FailureKind::SchemaShapeMismatch,
                            format!("response does not match shape {}", candidate.label),
                        ));
                    }
                },
                Err(error) if error.is_retryable() => {
                    return Err(JobFailure::new(
                        FailureKind::TransientNetworkError,
                        format!(
                            "{} (after {} attempts)",
                            error,
                            policy.retry.max_retries + 1
                        ),
                    ));
                }
                Err(error) => {
                    debug!(
                        job = kind.id(),
                        shape = candidate.label,
                        "Backend rejected query: {}",
                        error
                    );
                    shape_mismatch |= error.is_schema_mismatch();
                    last_failure = Some(JobFailure::from(error));
                }
            }
        }

        let last_failure = last_failure.unwrap_or_else(|| {
            JobFailure::new(FailureKind::SchemaShapeMismatch, "no query shapes to try")
        });
        if tried == 1 {
            return Err(last_failure);
        }
        let kind = if shape_mismatch {
            FailureKind::SchemaShapeMismatch
        } else {
            last_failure.kind
        };
        Err(JobFailure::new(
            kind,
            format!(
                "none of {} query shapes matched, last error: {}",
                tried, last_failure
            ),
        ))
    }

    async fn execute_with_retry(
        &self,
        kind: JobKind,
        request: &GraphqlRequest,
        policy: &JobPolicy,
    ) -> Result<JsonValue, GatewayError> {
        let options = policy.call_options();
        let mut retry_count = 0;
        loop {
            match self.ctx.gateway.execute(request, &options).await {
                Ok(data) => return Ok(data),
                Err(error) if policy.retry.should_retry(&error, retry_count) => {
                    let backoff = policy.retry.backoff(retry_count);
                    let backoff_ms = backoff.as_millis() as u64;
                    warn!(
                        job = kind.id(),
                        retry = retry_count + 1,
                        max_retries = policy.retry.max_retries,
                        backoff_ms,
                        "Request to {} failed: {}",
                        self.ctx.gateway.endpoint(),
                        error
                    );
                    tokio::time::sleep(backoff).await;
                    retry_count += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn error_line(timestamp: &str, failure: &JobFailure) -> LogLine {
    LogLine::new(timestamp, format!("ERROR: {}", failure))
}
