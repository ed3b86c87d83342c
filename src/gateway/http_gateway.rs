//! HTTP transport for the CRM GraphQL endpoint.

use super::{CallOptions, CrmGateway, GatewayError, GraphqlRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<JsonValue>,
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: Option<String>,
}

/// GraphQL client posting `{query, variables}` to a single endpoint.
pub struct HttpGateway {
    endpoint: String,
    client: Client,
    /// Used for jobs whose policy disables certificate verification.
    insecure_client: Client,
}

impl HttpGateway {
    /// Create a gateway for the given endpoint (e.g., "http://127.0.0.1:8000/graphql").
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        let insecure_client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            insecure_client,
        })
    }

    fn client_for(&self, options: &CallOptions) -> &Client {
        if options.verify_tls {
            &self.client
        } else {
            &self.insecure_client
        }
    }
}

#[async_trait]
impl CrmGateway for HttpGateway {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(
        &self,
        request: &GraphqlRequest,
        options: &CallOptions,
    ) -> Result<JsonValue, GatewayError> {
        debug!(
            endpoint = %self.endpoint,
            timeout_ms = options.timeout.as_millis() as u64,
            verify_tls = options.verify_tls,
            "Sending GraphQL request"
        );

        let response = self
            .client_for(options)
            .post(&self.endpoint)
            .json(request)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphqlResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::InvalidResponse(format!("Failed to parse GraphQL response: {}", e))
            }
        })?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            return Err(GatewayError::Graphql(
                errors
                    .into_iter()
                    .map(|e| e.message.unwrap_or_else(|| "unknown error".to_string()))
                    .collect(),
            ));
        }

        match body.data {
            Some(data) if data.is_object() => Ok(data),
            _ => Err(GatewayError::InvalidResponse(
                "Response has no data object".to_string(),
            )),
        }
    }
}
