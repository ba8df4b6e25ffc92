//! Core domain types for the Luna cycle tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Period records and derived date helpers
//! - Per-user cycle settings
//! - The derived "today" snapshot and fertility status

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days between predicted ovulation and the following period start.
pub const LUTEAL_PHASE_DAYS: i64 = 14;

/// Clinically normal cycle length bounds, in days (start to next start).
pub const NORMAL_CYCLE_MIN: i64 = 21;
pub const NORMAL_CYCLE_MAX: i64 = 35;

/// Clinically normal period duration bounds, in days.
pub const NORMAL_DURATION_MIN: i64 = 3;
pub const NORMAL_DURATION_MAX: i64 = 7;

// ============================================================================
// Period Records
// ============================================================================

/// One logged period: a contiguous run of bleeding days.
///
/// Records are uniquely identified by `start_date` within a user's history;
/// the storage layer never keeps two records with the same start.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodRecord {
    pub start_date: NaiveDate,
    /// Number of bleeding days, inclusive of the start date. Always >= 1.
    pub duration_days: u32,
}

impl PeriodRecord {
    pub fn new(start_date: NaiveDate, duration_days: u32) -> Self {
        Self {
            start_date,
            duration_days: duration_days.max(1),
        }
    }

    /// Last bleeding day: `start_date + duration_days - 1`.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::days(i64::from(self.duration_days) - 1)
    }

    /// Whether `date` falls within `[start_date, end_date]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date()
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-user cycle settings, recomputed on every history save and editable
/// through the explicit "set cycle length" action.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleSettings {
    /// Days between the start of one period and the start of the next.
    pub average_cycle_length: u32,
    /// Days a period lasts.
    pub average_period_length: u32,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            average_cycle_length: 28,
            average_period_length: 5,
        }
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Conception likelihood band around predicted ovulation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FertilityStatus {
    High,
    Medium,
    #[default]
    Low,
}

impl std::fmt::Display for FertilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FertilityStatus::High => "High",
            FertilityStatus::Medium => "Medium",
            FertilityStatus::Low => "Low",
        };
        f.write_str(label)
    }
}

/// The derived "today" view of a user's cycle. Not persisted.
///
/// When `has_data` is false (no history at all) every other field holds its
/// default and must not be shown to the user.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub has_data: bool,
    /// 1-based day count since the most recent period's start.
    pub current_cycle_day: i64,
    /// Days until the projected next period start, clamped to >= 0.
    pub days_until_next_period: i64,
    /// Days until projected ovulation. Signed: negative means ovulation for
    /// the current projection already passed.
    pub days_until_ovulation: i64,
    pub fertility_status: FertilityStatus,
    /// Whether today falls within the most recent record's date span.
    pub is_on_period: bool,
    /// 0-100; only meaningful while `is_on_period` is true.
    pub period_progress_percent: u8,
    /// The most recent record, carried so display and tip selection need no
    /// second store read.
    pub last_period: Option<PeriodRecord>,
    /// The cycle length the projection used.
    pub average_cycle_length: u32,
}
