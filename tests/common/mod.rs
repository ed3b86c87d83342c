//! Common test infrastructure
//!
//! Spawns an in-process fake CRM GraphQL backend and builds reporters wired
//! to it. Tests should only import from this module.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeCrm, TestReporter};
//!
//! #[tokio::test]
//! async fn test_heartbeat() {
//!     let crm = FakeCrm::spawn().await;
//!     let harness = TestReporter::new(&crm);
//!
//!     assert!(harness.reporter.run_heartbeat().await.is_success());
//! }
//! ```

mod fake_crm;
mod harness;

pub use fake_crm::{FakeCrm, FakeOrder, FakeProduct, OrdersSchema};
pub use harness::TestReporter;
