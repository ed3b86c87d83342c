//! Low-stock replenishment job.
//!
//! Asks the backend to restock every product below [`LOW_STOCK_THRESHOLD`]
//! and logs the products it touched.

use crate::gateway::GraphqlRequest;
use crate::reporter::job::{JobKind, QueryCandidate, ReportJob};
use crate::reporter::result::{JobOutput, StockLevel};
use crate::sink::LogLine;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

/// Products with stock strictly below this value are restocked.
pub const LOW_STOCK_THRESHOLD: u64 = 10;

const UPDATE_LOW_STOCK_MUTATION: &str = "mutation UpdateLowStock($inc: Int) { \
     updateLowStockProducts(increment: $inc) { message updatedProducts { id name stock } } }";

/// What the mutation reported back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplenishmentOutcome {
    pub message: String,
    pub items: Vec<StockLevel>,
}

pub struct LowStockJob {
    increment_by: u32,
}

impl LowStockJob {
    pub fn new(increment_by: u32) -> Self {
        Self { increment_by }
    }
}

fn parse_stock_level(product: &JsonValue) -> Option<StockLevel> {
    let name = product.get("name").and_then(JsonValue::as_str);
    let stock = product.get("stock").and_then(JsonValue::as_u64);
    match (name, stock) {
        (Some(name), Some(stock)) => Some(StockLevel {
            name: name.to_string(),
            stock_after_update: stock,
        }),
        _ => {
            warn!("Skipping malformed updated product: {}", product);
            None
        }
    }
}

fn extract_outcome(data: &JsonValue) -> Option<ReplenishmentOutcome> {
    let payload = data.get("updateLowStockProducts")?.as_object()?;

    let message = payload
        .get("message")
        .and_then(JsonValue::as_str)
        .unwrap_or("No message")
        .to_string();

    let items = match payload.get("updatedProducts") {
        Some(JsonValue::Array(products)) => {
            products.iter().filter_map(parse_stock_level).collect()
        }
        Some(JsonValue::Null) | None => Vec::new(),
        Some(_) => return None,
    };

    Some(ReplenishmentOutcome { message, items })
}

impl ReportJob for LowStockJob {
    type Output = ReplenishmentOutcome;

    fn kind(&self) -> JobKind {
        JobKind::LowStock
    }

    fn candidates(&self) -> Vec<QueryCandidate<ReplenishmentOutcome>> {
        let request = GraphqlRequest::new(UPDATE_LOW_STOCK_MUTATION)
            .with_variables(json!({ "inc": self.increment_by }));
        vec![QueryCandidate::new(
            "updateLowStockProducts",
            request,
            extract_outcome,
        )]
    }

    fn render(&self, outcome: &ReplenishmentOutcome, timestamp: &str) -> Vec<LogLine> {
        let mut lines = vec![LogLine::new(timestamp, &outcome.message)];
        if outcome.items.is_empty() {
            lines.push(LogLine::new(timestamp, "- No products updated"));
        } else {
            lines.extend(outcome.items.iter().map(|item| {
                LogLine::new(
                    timestamp,
                    format!("- {} -> stock={}", item.name, item.stock_after_update),
                )
            }));
        }
        lines
    }

    fn finish(&self, outcome: ReplenishmentOutcome) -> JobOutput {
        JobOutput::Replenishment {
            message: outcome.message,
            items: outcome.items,
        }
    }
}
