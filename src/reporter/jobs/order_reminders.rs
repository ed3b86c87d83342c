//! Order reminder job.
//!
//! Logs one reminder per order placed within the lookback window. The
//! backend schema has shipped under several spellings (`orders` or
//! `allOrders`, `orderDate` or `order_date`), so every known shape is tried
//! in order.

use crate::gateway::GraphqlRequest;
use crate::reporter::job::{JobKind, QueryCandidate, ReportJob};
use crate::reporter::result::{JobOutput, OrderReminder};
use crate::sink::LogLine;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

struct OrderShape {
    label: &'static str,
    collection: &'static str,
    date_field: &'static str,
}

static ORDER_SHAPES: [OrderShape; 4] = [
    OrderShape {
        label: "orders/orderDate",
        collection: "orders",
        date_field: "orderDate",
    },
    OrderShape {
        label: "orders/order_date",
        collection: "orders",
        date_field: "order_date",
    },
    OrderShape {
        label: "allOrders/orderDate",
        collection: "allOrders",
        date_field: "orderDate",
    },
    OrderShape {
        label: "allOrders/order_date",
        collection: "allOrders",
        date_field: "order_date",
    },
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Reminders found in one run and the shape that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemindersOutcome {
    pub shape: &'static str,
    pub orders: Vec<OrderReminder>,
}

pub struct OrderRemindersJob {
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

impl OrderRemindersJob {
    /// Orders dated within `[now - lookback_days, now]` qualify. A window
    /// reaching past the earliest representable date starts there.
    pub fn new(lookback_days: u32, now: DateTime<Utc>) -> Self {
        let window_start = now
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            window_start,
            window_end: now,
        }
    }
}

/// Parse an order timestamp.
///
/// Accepts RFC 3339 (`Z` or `+hh:mm`), `+hhmm` offsets, naive date-times
/// (taken as UTC), bare dates (midnight UTC) and numeric Unix seconds.
pub fn parse_order_date(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(text) => parse_order_date_str(text),
        JsonValue::Number(number) => {
            let secs = number.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
        _ => None,
    }
}

fn parse_order_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn render_id(id: Option<&JsonValue>) -> String {
    match id {
        Some(JsonValue::String(id)) => id.clone(),
        Some(JsonValue::Number(id)) => id.to_string(),
        _ => "unknown".to_string(),
    }
}

fn extract_reminders(
    data: &JsonValue,
    shape: &'static OrderShape,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Option<RemindersOutcome> {
    let orders = data.get(shape.collection)?.as_array()?;

    let orders = orders
        .iter()
        .filter_map(|order| {
            let order_date = order.get(shape.date_field).and_then(parse_order_date)?;
            if order_date < window_start || order_date > window_end {
                return None;
            }
            let customer_email = order
                .get("customer")
                .and_then(|customer| customer.get("email"))
                .and_then(JsonValue::as_str)
                .map(str::to_string);
            Some(OrderReminder {
                id: render_id(order.get("id")),
                customer_email,
                order_date,
            })
        })
        .collect();

    Some(RemindersOutcome {
        shape: shape.label,
        orders,
    })
}

impl ReportJob for OrderRemindersJob {
    type Output = RemindersOutcome;

    fn kind(&self) -> JobKind {
        JobKind::OrderReminders
    }

    fn candidates(&self) -> Vec<QueryCandidate<RemindersOutcome>> {
        let (window_start, window_end) = (self.window_start, self.window_end);
        ORDER_SHAPES
            .iter()
            .map(|shape| {
                let query = format!(
                    "query {{ {} {{ id {} customer {{ email }} }} }}",
                    shape.collection, shape.date_field
                );
                QueryCandidate::new(shape.label, GraphqlRequest::new(query), move |data| {
                    extract_reminders(data, shape, window_start, window_end)
                })
            })
            .collect()
    }

    fn render(&self, outcome: &RemindersOutcome, timestamp: &str) -> Vec<LogLine> {
        outcome
            .orders
            .iter()
            .map(|order| {
                LogLine::new(
                    timestamp,
                    format!(
                        "- Order {} - {}",
                        order.id,
                        order.customer_email.as_deref().unwrap_or("unknown")
                    ),
                )
            })
            .collect()
    }

    fn finish(&self, outcome: RemindersOutcome) -> JobOutput {
        JobOutput::Reminders {
            shape: outcome.shape,
            orders: outcome.orders,
        }
    }
}
