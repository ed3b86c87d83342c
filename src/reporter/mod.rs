//! Periodic reporting jobs.
//!
//! Every job follows the same routine: query the CRM backend, render
//! timestamped lines, append them to the job's sink. Failures turn into an
//! `ERROR` line and a [`JobResult::Failure`] instead of an error.

mod context;
mod job;
pub mod jobs;
mod result;
mod retry_policy;
mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use context::JobContext;
pub use job::{Extractor, JobKind, JobSchedule, QueryCandidate, ReportJob};
pub use jobs::LOW_STOCK_THRESHOLD;
pub use result::{
    FailureKind, JobFailure, JobOutput, JobResult, MetricsSnapshot, OrderReminder, ProbeStatus,
    StockLevel,
};
pub use retry_policy::{JobPolicies, JobPolicy, RetryPolicy};
pub use runner::Reporter;
