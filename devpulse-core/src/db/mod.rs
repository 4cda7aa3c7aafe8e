//! Raw metrics store for devpulse
//!
//! SQLite storage for the rows the metrics engine reads:
//! - Schema migrations
//! - Inserts with duplicate handling
//! - Owner/date/language filtered list queries
//!
//! Derived metrics are never written back; every query recomputes them.

pub mod repo;
pub mod schema;

pub use repo::{Database, MetricsFilter};
