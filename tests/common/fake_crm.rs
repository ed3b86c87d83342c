//! Fake CRM backend
//!
//! Answers the handful of GraphQL operations the reporter sends, backed by
//! in-memory products, customers and orders. The spelling of the orders
//! collection and its date field is configurable, and the server can be told
//! to answer the next N requests with 503.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use crm_reporter::LOW_STOCK_THRESHOLD;
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct FakeProduct {
    pub id: String,
    pub name: String,
    pub stock: u64,
}

impl FakeProduct {
    pub fn new(id: &str, name: &str, stock: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            stock,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeOrder {
    pub id: String,
    pub email: Option<String>,
    pub order_date: String,
    pub total_amount: JsonValue,
}

impl FakeOrder {
    pub fn new(id: &str, email: Option<&str>, order_date: &str, total_amount: JsonValue) -> Self {
        Self {
            id: id.to_string(),
            email: email.map(str::to_string),
            order_date: order_date.to_string(),
            total_amount,
        }
    }
}

/// How the backend names the orders collection and its date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdersSchema {
    pub collection: &'static str,
    pub date_field: &'static str,
}

impl Default for OrdersSchema {
    fn default() -> Self {
        Self {
            collection: "orders",
            date_field: "orderDate",
        }
    }
}

#[derive(Default)]
struct CrmState {
    products: Vec<FakeProduct>,
    customers: Vec<String>,
    orders: Vec<FakeOrder>,
    schema: OrdersSchema,
    unavailable_for: u32,
    queries: Vec<String>,
}

type SharedState = Arc<Mutex<CrmState>>;

/// Fake backend listening on a random local port.
///
/// When dropped, the server shuts down.
pub struct FakeCrm {
    /// GraphQL endpoint (e.g., "http://127.0.0.1:12345/graphql")
    pub graphql_url: String,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeCrm {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(CrmState::default()));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = Router::new()
            .route("/graphql", post(graphql))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake CRM failed");
        });

        Self {
            graphql_url: format!("http://127.0.0.1:{}/graphql", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn set_products(&self, products: Vec<FakeProduct>) {
        self.state.lock().unwrap().products = products;
    }

    pub fn products(&self) -> Vec<FakeProduct> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn set_customers(&self, ids: &[&str]) {
        self.state.lock().unwrap().customers = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn set_orders(&self, orders: Vec<FakeOrder>) {
        self.state.lock().unwrap().orders = orders;
    }

    pub fn set_orders_schema(&self, schema: OrdersSchema) {
        self.state.lock().unwrap().schema = schema;
    }

    /// Answer the next `count` requests with 503 Service Unavailable.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap().unavailable_for = count;
    }

    /// Every query received so far, including rejected ones.
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }
}

fn graphql_errors(messages: &[String]) -> Response {
    let errors: Vec<JsonValue> = messages
        .iter()
        .map(|message| json!({ "message": message }))
        .collect();
    Json(json!({ "data": null, "errors": errors })).into_response()
}

fn unknown_field(field: &str) -> Response {
    graphql_errors(&[format!(
        "Cannot query field \"{}\" on type \"Query\".",
        field
    )])
}

async fn graphql(State(state): State<SharedState>, Json(body): Json<JsonValue>) -> Response {
    let query = body
        .get("query")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();
    let variables = body.get("variables").cloned().unwrap_or(JsonValue::Null);

    let mut state = state.lock().unwrap();
    state.queries.push(query.clone());

    if state.unavailable_for > 0 {
        state.unavailable_for -= 1;
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response();
    }

    if query.contains("hello") {
        return Json(json!({ "data": { "hello": "Hello, GraphQL!" } })).into_response();
    }

    if query.contains("updateLowStockProducts") {
        let increment = variables.get("inc").and_then(JsonValue::as_u64).unwrap_or(10);
        let mut updated = Vec::new();
        for product in state.products.iter_mut() {
            if product.stock < LOW_STOCK_THRESHOLD {
                product.stock += increment;
                updated.push(json!({
                    "id": product.id,
                    "name": product.name,
                    "stock": product.stock
                }));
            }
        }
        let message = if updated.is_empty() {
            "No low-stock products found".to_string()
        } else {
            format!("Updated {} low-stock products", updated.len())
        };
        return Json(json!({
            "data": {
                "updateLowStockProducts": { "message": message, "updatedProducts": updated }
            }
        }))
        .into_response();
    }

    if query.contains("totalCustomers") {
        return unknown_field("totalCustomers");
    }

    if query.contains("customers") {
        let customers: Vec<JsonValue> = state
            .customers
            .iter()
            .map(|id| json!({ "id": id }))
            .collect();
        let orders: Vec<JsonValue> = state
            .orders
            .iter()
            .map(|order| json!({ "id": order.id, "totalAmount": order.total_amount }))
            .collect();
        return Json(json!({ "data": { "customers": customers, "orders": orders } }))
            .into_response();
    }

    let collection = if query.contains("allOrders") {
        "allOrders"
    } else if query.contains("orders") {
        "orders"
    } else {
        return graphql_errors(&[format!("Unsupported query: {}", query)]);
    };
    let date_field = if query.contains("order_date") {
        "order_date"
    } else {
        "orderDate"
    };

    if collection != state.schema.collection {
        return unknown_field(collection);
    }
    if date_field != state.schema.date_field {
        return graphql_errors(&[format!(
            "Cannot query field \"{}\" on type \"OrderType\".",
            date_field
        )]);
    }

    let orders: Vec<JsonValue> = state
        .orders
        .iter()
        .map(|order| {
            let mut value = json!({ "id": order.id });
            value[date_field] = json!(order.order_date);
            value["customer"] = match &order.email {
                Some(email) => json!({ "email": email }),
                None => JsonValue::Null,
            };
            value
        })
        .collect();

    let mut data = json!({});
    data[collection] = JsonValue::Array(orders);
    Json(json!({ "data": data })).into_response()
}
