//! In-memory gateway and context helpers for unit tests.

use super::context::JobContext;
use super::retry_policy::JobPolicies;
use crate::clock::FixedClock;
use crate::config::SinkPaths;
use crate::gateway::{CallOptions, CrmGateway, GatewayError, GraphqlRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Handler =
    Box<dyn Fn(&GraphqlRequest, usize) -> Result<JsonValue, GatewayError> + Send + Sync>;

/// Gateway answering every call through a closure. The closure also gets
/// the zero-based index of the call.
pub(crate) struct ScriptedGateway {
    handler: Handler,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(
        handler: impl Fn(&GraphqlRequest, usize) -> Result<JsonValue, GatewayError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrmGateway for ScriptedGateway {
    fn endpoint(&self) -> &str {
        "scripted://crm"
    }

    async fn execute(
        &self,
        request: &GraphqlRequest,
        _options: &CallOptions,
    ) -> Result<JsonValue, GatewayError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(request.query.clone());
        (self.handler)(request, index)
    }
}

/// Default policies without any backoff delay.
pub(crate) fn instant_policies() -> JobPolicies {
    let mut policies = JobPolicies::default();
    for kind in super::JobKind::ALL {
        policies.for_kind_mut(kind).retry.initial_backoff_ms = 0;
    }
    policies
}

pub(crate) fn test_context(
    gateway: Arc<ScriptedGateway>,
    log_dir: &Path,
    now: DateTime<Utc>,
) -> JobContext {
    JobContext {
        gateway,
        clock: Arc::new(FixedClock(now)),
        sinks: SinkPaths::in_dir(log_dir),
        policies: instant_policies(),
        heartbeat_subject: "CRM".to_string(),
    }
}

pub(crate) fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
