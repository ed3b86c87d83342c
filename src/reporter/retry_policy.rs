//! Per-job call policy: timeout, TLS verification and retry backoff.
//!
//! Implements exponential backoff with configurable parameters.

use super::job::JobKind;
use crate::gateway::{CallOptions, GatewayError};
use std::time::Duration;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds (cap for exponential growth).
    pub max_backoff_ms: u64,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Check if an error should be retried given the current retry count.
    ///
    /// Returns true if:
    /// - The error is retryable (timeouts, connection errors, 5xx/429)
    /// - The retry count is less than max_retries
    pub fn should_retry(&self, error: &GatewayError, retry_count: u32) -> bool {
        error.is_retryable() && retry_count < self.max_retries
    }

    /// Backoff before the retry following `retry_count` earlier retries.
    ///
    /// Uses exponential backoff: `initial_backoff * multiplier^retry_count`,
    /// capped at `max_backoff_ms`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let backoff = self.initial_backoff_ms as f64
            * self
                .backoff_multiplier
                .powi(retry_count.min(i32::MAX as u32) as i32);
        Duration::from_millis(backoff.min(self.max_backoff_ms as f64) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Everything that governs a job's calls to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPolicy {
    pub timeout: Duration,
    pub verify_tls: bool,
    pub retry: RetryPolicy,
}

impl JobPolicy {
    /// Conservative defaults per job.
    pub fn default_for(kind: JobKind) -> Self {
        let (timeout_secs, max_retries, verify_tls) = match kind {
            JobKind::Heartbeat => (5, 1, false),
            JobKind::LowStock => (10, 3, true),
            JobKind::WeeklyReport => (10, 2, false),
            JobKind::OrderReminders => (10, 3, false),
        };
        Self {
            timeout: Duration::from_secs(timeout_secs),
            verify_tls,
            retry: RetryPolicy {
                max_retries,
                ..Default::default()
            },
        }
    }

    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            timeout: self.timeout,
            verify_tls: self.verify_tls,
        }
    }
}

/// Policies for all four jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPolicies {
    pub heartbeat: JobPolicy,
    pub low_stock: JobPolicy,
    pub weekly_report: JobPolicy,
    pub order_reminders: JobPolicy,
}

impl JobPolicies {
    pub fn for_kind(&self, kind: JobKind) -> &JobPolicy {
        match kind {
            JobKind::Heartbeat => &self.heartbeat,
            JobKind::LowStock => &self.low_stock,
            JobKind::WeeklyReport => &self.weekly_report,
            JobKind::OrderReminders => &self.order_reminders,
        }
    }

    pub fn for_kind_mut(&mut self, kind: JobKind) -> &mut JobPolicy {
        match kind {
            JobKind::Heartbeat => &mut self.heartbeat,
            JobKind::LowStock => &mut self.low_stock,
            JobKind::WeeklyReport => &mut self.weekly_report,
            JobKind::OrderReminders => &mut self.order_reminders,
        }
    }
}

impl Default for JobPolicies {
    fn default() -> Self {
        Self {
            heartbeat: JobPolicy::default_for(JobKind::Heartbeat),
            low_stock: JobPolicy::default_for(JobKind::LowStock),
            weekly_report: JobPolicy::default_for(JobKind::WeeklyReport),
            order_reminders: JobPolicy::default_for(JobKind::OrderReminders),
        }
    }
}
