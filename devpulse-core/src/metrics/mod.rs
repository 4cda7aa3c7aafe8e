//! Metrics aggregation engine
//!
//! Turns raw commit rows and raw Copilot usage rows into time-bucketed
//! productivity and AI-adoption figures.
//!
//! ## Architecture
//!
//! ```text
//! raw commit rows ──► commits::aggregate ─┐
//!        │                                 ├─► productivity ─┐
//!        └──────────► period buckets ──────┤                 │
//!                                          │                 ├─► queries ─► report
//! raw usage rows ───► period buckets ──────┼─► usage_period ─┤
//!        │                                 ├─► language ─────┤
//! raw chat rows ───────────────────────────┴─► users ────────┘
//! ```
//!
//! Everything below [`queries`] is a pure function over slices: no I/O, no
//! shared state. [`queries`] and [`report`] read from the raw store.

pub mod commits;
pub mod language;
pub mod period;
pub mod productivity;
pub mod queries;
pub mod ratio;
pub mod report;
pub mod usage_period;
pub mod users;

#[cfg(test)]
pub(crate) mod testutil;

pub use commits::CanonicalCommit;
pub use language::LanguageBreakdown;
pub use period::{Bucket, Period};
pub use productivity::{
    CalculatedMetrics, CodeLineMetricsBucket, CodeLinesNormalization, CodeLinesStrategy,
    CommitCountBucket, CommitCountStrategy, ProductivityMetric, ProductivitySeries,
    ProductivityStrategy,
};
pub use ratio::{GroupedRatio, GroupedTotal};
pub use report::{generate_report, MetricsReport};
pub use usage_period::PeriodBreakdown;
pub use users::UsersBucket;
