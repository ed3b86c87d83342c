//! CRM heartbeat job.
//!
//! Appends `<timestamp> <subject> is alive (<probe status>)` on every run.
//! The GraphQL `{ hello }` probe only decides the annotation; a dead
//! backend still produces the liveness line.

use crate::gateway::GraphqlRequest;
use crate::reporter::job::{JobKind, QueryCandidate, ReportJob};
use crate::reporter::result::{JobFailure, JobOutput, ProbeStatus};
use crate::sink::LogLine;
use serde_json::Value as JsonValue;

const HELLO_QUERY: &str = "{ hello }";

pub struct HeartbeatJob {
    subject: String,
}

impl HeartbeatJob {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

fn probe_status(data: &JsonValue) -> ProbeStatus {
    match data.get("hello") {
        Some(hello) if !hello.is_null() => ProbeStatus::Ok,
        _ => ProbeStatus::NoHello,
    }
}

impl ReportJob for HeartbeatJob {
    type Output = ProbeStatus;

    fn kind(&self) -> JobKind {
        JobKind::Heartbeat
    }

    fn candidates(&self) -> Vec<QueryCandidate<ProbeStatus>> {
        vec![QueryCandidate::new(
            "hello",
            GraphqlRequest::new(HELLO_QUERY),
            |data| Some(probe_status(data)),
        )]
    }

    fn recover(&self, failure: &JobFailure) -> Option<ProbeStatus> {
        Some(ProbeStatus::Failed {
            kind: failure.kind,
            detail: failure.detail.clone(),
        })
    }

    fn render(&self, probe: &ProbeStatus, timestamp: &str) -> Vec<LogLine> {
        vec![LogLine::new(
            timestamp,
            format!("{} is alive ({})", self.subject, probe.annotation()),
        )]
    }

    fn finish(&self, probe: ProbeStatus) -> JobOutput {
        JobOutput::Heartbeat { probe }
    }
}
