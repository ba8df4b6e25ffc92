#![forbid(unsafe_code)]

//! Core domain model and business logic for the Luna cycle tracker.
//!
//! This crate provides:
//! - Domain types (period records, settings, snapshots)
//! - Per-user preference storage
//! - Cycle statistics and predictions
//! - History mutation operations
//! - Daily tips and CSV reporting

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod predictor;
pub mod tracker;
pub mod tips;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::CycleStore;
pub use tracker::CycleTracker;
pub use tips::daily_tip;
pub use report::{cycle_rows, export_csv, CycleRow, RangeStatus};
