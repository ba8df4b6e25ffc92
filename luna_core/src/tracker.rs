//! History mutation operations.
//!
//! `CycleTracker` is the write path of the engine: it loads the current
//! history from the store, applies one validated change, and saves the full
//! list back, which refreshes the cached averages as a side effect. Records
//! are addressed by their exact `start_date`.

use crate::store::CycleStore;
use crate::types::{CycleSettings, CycleSnapshot, PeriodRecord};
use crate::{predictor, Error, Result};
use chrono::NaiveDate;
use std::path::Path;

pub struct CycleTracker {
    store: CycleStore,
}

impl CycleTracker {
    pub fn new(store: CycleStore) -> Self {
        Self { store }
    }

    /// Convenience constructor for one user profile under `data_dir`.
    pub fn open(data_dir: &Path, user_key: impl Into<String>) -> Self {
        Self::new(CycleStore::open(data_dir, user_key))
    }

    pub fn store(&self) -> &CycleStore {
        &self.store
    }

    pub fn history(&self) -> Vec<PeriodRecord> {
        self.store.history()
    }

    pub fn settings(&self) -> CycleSettings {
        self.store.settings()
    }

    /// The "today" view for this profile.
    pub fn snapshot(&self, today: NaiveDate) -> CycleSnapshot {
        predictor::snapshot(&self.history(), &self.settings(), today)
    }

    /// Log a period by start date and duration in days.
    pub fn add_period(&self, start_date: NaiveDate, duration_days: u32) -> Result<PeriodRecord> {
        self.insert(PeriodRecord::new(start_date, duration_days))
    }

    /// Log a period by its first and last bleeding day (both inclusive).
    ///
    /// Fails with [`Error::InvalidRange`] when `end_date < start_date`,
    /// leaving stored history untouched. Overlap with existing records is
    /// accepted; rejecting or confirming overlaps is the caller's concern.
    pub fn add_period_with_dates(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PeriodRecord> {
        if end_date < start_date {
            return Err(Error::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let duration_days = ((end_date - start_date).num_days() + 1) as u32;
        self.insert(PeriodRecord::new(start_date, duration_days))
    }

    fn insert(&self, record: PeriodRecord) -> Result<PeriodRecord> {
        let mut history = self.history();

        if let Some(existing) = history
            .iter_mut()
            .find(|r| r.start_date == record.start_date)
        {
            tracing::warn!(
                "Replacing existing period starting {} ({} -> {} days)",
                record.start_date,
                existing.duration_days,
                record.duration_days
            );
            *existing = record;
        } else {
            history.push(record);
        }

        self.store.save_history(&history)?;
        tracing::info!(
            "Logged period starting {} for {} days",
            record.start_date,
            record.duration_days
        );
        Ok(record)
    }

    /// Change the end date of the record starting exactly on `start_date`.
    ///
    /// Fails with [`Error::InvalidRange`] when `new_end_date < start_date`
    /// and with [`Error::NotFound`] when no record starts on that date.
    pub fn update_period_end_date(
        &self,
        start_date: NaiveDate,
        new_end_date: NaiveDate,
    ) -> Result<PeriodRecord> {
        if new_end_date < start_date {
            return Err(Error::InvalidRange {
                start: start_date,
                end: new_end_date,
            });
        }

        let mut history = self.history();
        let record = history
            .iter_mut()
            .find(|r| r.start_date == start_date)
            .ok_or(Error::NotFound(start_date))?;

        record.duration_days = ((new_end_date - start_date).num_days() + 1) as u32;
        let updated = *record;

        self.store.save_history(&history)?;
        tracing::info!(
            "Updated period starting {} to end {}",
            start_date,
            new_end_date
        );
        Ok(updated)
    }

    /// Remove the record starting exactly on `start_date`.
    pub fn delete_period(&self, start_date: NaiveDate) -> Result<PeriodRecord> {
        let mut history = self.history();
        let index = history
            .iter()
            .position(|r| r.start_date == start_date)
            .ok_or(Error::NotFound(start_date))?;

        let removed = history.remove(index);
        self.store.save_history(&history)?;
        tracing::info!("Deleted period starting {}", start_date);
        Ok(removed)
    }

    /// Remove every record for this profile.
    pub fn clear_history(&self) -> Result<()> {
        self.store.save_history(&[])?;
        tracing::info!("Cleared history for {}", self.store.user_key());
        Ok(())
    }

    /// The explicit "set cycle length" user action.
    pub fn set_average_cycle_length(&self, days: u32) -> Result<()> {
        self.store.set_average_cycle_length(days)
    }
}
