//! CRM Reporter Library
//!
//! Periodic reporting jobs for the CRM GraphQL backend: heartbeat, low-stock
//! replenishment, weekly report and order reminders. Each job queries the
//! backend, appends timestamped lines to its log sink and never fails past
//! its own boundary.

pub mod clock;
pub mod config;
pub mod gateway;
pub mod reporter;
pub mod sink;

// Re-export commonly used types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use gateway::{CrmGateway, HttpGateway};
pub use reporter::{JobKind, JobResult, Reporter, LOW_STOCK_THRESHOLD};
