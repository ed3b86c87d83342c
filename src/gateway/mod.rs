//! Access to the CRM GraphQL backend.
//!
//! Jobs only talk to the backend through [`CrmGateway`], so tests can swap
//! the HTTP transport for an in-memory one.

mod http_gateway;

pub use http_gateway::HttpGateway;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// A GraphQL document plus optional variables.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<JsonValue>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: JsonValue) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Per-call transport options, taken from the job policy.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            verify_tls: true,
        }
    }
}

/// Errors returned by a gateway call.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Returns true if the call may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Connection(_) => true,
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
            GatewayError::Graphql(_) | GatewayError::InvalidResponse(_) => false,
        }
    }

    /// Returns true if the backend rejected the query because its schema
    /// lacks a requested field or type.
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            GatewayError::Graphql(messages) => messages.iter().any(|message| {
                SCHEMA_ERROR_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            }),
            _ => false,
        }
    }
}

/// Validation messages a GraphQL server emits for fields or types it does not have.
const SCHEMA_ERROR_MARKERS: [&str; 3] = ["Cannot query field", "Unknown type", "Unknown argument"];

/// Request/response access to the CRM backend.
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// Address of the backend, for logging.
    fn endpoint(&self) -> &str;

    /// Execute a query or mutation and return its `data` object.
    ///
    /// Fails if the response carries any GraphQL errors.
    async fn execute(
        &self,
        request: &GraphqlRequest,
        options: &CallOptions,
    ) -> Result<JsonValue, GatewayError>;
}
