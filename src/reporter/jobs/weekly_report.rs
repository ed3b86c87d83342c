//! Weekly CRM report job.
//!
//! Logs customer and order counts plus the revenue of all orders.

use crate::gateway::GraphqlRequest;
use crate::reporter::job::{JobKind, QueryCandidate, ReportJob};
use crate::reporter::result::{JobOutput, MetricsSnapshot};
use crate::sink::LogLine;
use serde_json::Value as JsonValue;
use tracing::warn;

const REPORT_QUERY: &str = "query { customers { id } orders { id totalAmount } }";
const AGGREGATE_REPORT_QUERY: &str = "query { totalCustomers totalOrders totalRevenue }";

pub struct WeeklyReportJob;

/// Parse a money amount sent either as a JSON number or a decimal string.
fn parse_amount(value: &JsonValue) -> Option<f64> {
    let amount = match value {
        JsonValue::Number(number) => number.as_f64()?,
        JsonValue::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

/// Sum order totals. Orders without a usable amount count as zero.
pub(crate) fn sum_revenue(orders: &[JsonValue]) -> f64 {
    let mut total = 0.0;
    let mut skipped = 0;
    for order in orders {
        match order.get("totalAmount").and_then(parse_amount) {
            Some(amount) => total += amount,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(
            "Skipped {} of {} orders with a missing or malformed totalAmount",
            skipped,
            orders.len()
        );
    }
    total
}

fn extract_from_collections(data: &JsonValue) -> Option<MetricsSnapshot> {
    let customers = data.get("customers")?.as_array()?;
    let orders = data.get("orders")?.as_array()?;
    Some(MetricsSnapshot {
        customer_count: customers.len() as u64,
        order_count: orders.len() as u64,
        revenue_total: sum_revenue(orders),
        ..Default::default()
    })
}

fn extract_from_aggregates(data: &JsonValue) -> Option<MetricsSnapshot> {
    Some(MetricsSnapshot {
        customer_count: data.get("totalCustomers")?.as_u64()?,
        order_count: data.get("totalOrders")?.as_u64()?,
        revenue_total: data
            .get("totalRevenue")
            .and_then(parse_amount)
            .unwrap_or(0.0),
        ..Default::default()
    })
}

impl ReportJob for WeeklyReportJob {
    type Output = MetricsSnapshot;

    fn kind(&self) -> JobKind {
        JobKind::WeeklyReport
    }

    fn candidates(&self) -> Vec<QueryCandidate<MetricsSnapshot>> {
        vec![
            QueryCandidate::new(
                "collections",
                GraphqlRequest::new(REPORT_QUERY),
                extract_from_collections,
            ),
            QueryCandidate::new(
                "aggregates",
                GraphqlRequest::new(AGGREGATE_REPORT_QUERY),
                extract_from_aggregates,
            ),
        ]
    }

    fn render(&self, snapshot: &MetricsSnapshot, timestamp: &str) -> Vec<LogLine> {
        vec![LogLine::new(
            timestamp,
            format!(
                "- Report: {} customers, {} orders, {:.2} revenue",
                snapshot.customer_count, snapshot.order_count, snapshot.revenue_total
            ),
        )]
    }

    fn finish(&self, snapshot: MetricsSnapshot) -> JobOutput {
        JobOutput::Report(snapshot)
    }
}
