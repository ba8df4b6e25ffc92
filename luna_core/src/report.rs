//! Cycle history reporting and CSV export.
//!
//! Produces the newest-first table behind the history/report views: each
//! record paired with the cycle length to the previous one and flagged
//! against the clinically normal ranges. The CSV export feeds external
//! charting.

use crate::types::{
    PeriodRecord, NORMAL_CYCLE_MAX, NORMAL_CYCLE_MIN, NORMAL_DURATION_MAX, NORMAL_DURATION_MIN,
};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// Where a value falls relative to its clinically normal range.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Short,
    Normal,
    Long,
}

impl RangeStatus {
    fn classify(value: i64, min: i64, max: i64) -> Self {
        if value < min {
            RangeStatus::Short
        } else if value > max {
            RangeStatus::Long
        } else {
            RangeStatus::Normal
        }
    }
}

/// One row of the report table.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CycleRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub duration_status: RangeStatus,
    /// Days from the previous period's start to this one; `None` for the
    /// oldest record.
    pub cycle_length_days: Option<i64>,
    pub cycle_length_status: Option<RangeStatus>,
}

/// Build the report rows, newest first.
pub fn cycle_rows(history: &[PeriodRecord]) -> Vec<CycleRow> {
    let mut sorted = history.to_vec();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    sorted
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let cycle_length_days = sorted
                .get(i + 1)
                .map(|older| (record.start_date - older.start_date).num_days());

            CycleRow {
                start_date: record.start_date,
                end_date: record.end_date(),
                duration_days: record.duration_days,
                duration_status: RangeStatus::classify(
                    i64::from(record.duration_days),
                    NORMAL_DURATION_MIN,
                    NORMAL_DURATION_MAX,
                ),
                cycle_length_days,
                cycle_length_status: cycle_length_days
                    .map(|l| RangeStatus::classify(l, NORMAL_CYCLE_MIN, NORMAL_CYCLE_MAX)),
            }
        })
        .collect()
}

/// Serialize the report rows as CSV.
pub fn export_csv<W: Write>(writer: W, history: &[PeriodRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for row in cycle_rows(history) {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
