//! Specific reporting job implementations.
//!
//! This module contains implementations of the `ReportJob` trait
//! for the jobs the external scheduler triggers.

pub mod heartbeat;
pub mod low_stock;
pub mod order_reminders;
pub mod weekly_report;

pub use heartbeat::HeartbeatJob;
pub use low_stock::{LowStockJob, ReplenishmentOutcome, LOW_STOCK_THRESHOLD};
pub use order_reminders::{parse_order_date, OrderRemindersJob, RemindersOutcome};
pub use weekly_report::WeeklyReportJob;
