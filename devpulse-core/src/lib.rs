//! # devpulse-core
//!
//! Core library for devpulse - developer productivity and AI-adoption metrics.
//!
//! This library provides:
//! - Domain types for raw commit and Copilot usage rows
//! - The metrics aggregation engine (bucketing, ratios, breakdowns)
//! - Raw data storage with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Raw:** commit rows and Copilot usage/chat rows in SQLite
//! - **Engine:** canonical commits, period buckets, ratios
//! - **Output:** serializable DTOs (series, breakdowns, reports), never persisted
//!
//! ## Example
//!
//! ```rust,no_run
//! use devpulse_core::metrics::queries;
//! use devpulse_core::{Config, Database, MetricsFilter, Period, ProductivityMetric};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let metrics = queries::calculated_metrics(
//!     &db,
//!     "acme",
//!     Period::Week,
//!     ProductivityMetric::CodeLines,
//!     config.metrics.code_lines_normalization,
//!     &MetricsFilter::new(),
//! )
//! .expect("query failed");
//! println!("{} buckets", metrics.series.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, MetricsFilter};
pub use error::{Error, Result};
pub use metrics::{
    CalculatedMetrics, CodeLinesNormalization, MetricsReport, Period, ProductivityMetric,
    ProductivitySeries,
};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod types;
