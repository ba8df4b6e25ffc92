//! Per-user preference storage for cycle history and settings.
//!
//! All persisted state lives in a single JSON key-value file per data
//! directory (`preferences.json`). Keys are scoped `<user>/<name>` for both
//! reads and writes, so two profiles in the same store never leak into each
//! other. A corrupt or unreadable file yields an empty map, and a corrupt
//! history value yields an empty history; neither is ever surfaced as an
//! error.

use crate::{predictor, PeriodRecord, CycleSettings, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const PREFS_FILE: &str = "preferences.json";

const HISTORY_KEY: &str = "cycle_history";
const AVG_CYCLE_KEY: &str = "average_cycle_length";
const AVG_PERIOD_KEY: &str = "average_period_length";
const LAST_PERIOD_KEY: &str = "last_period_date";

/// Current on-disk schema version for the history envelope.
const HISTORY_VERSION: u32 = 1;

/// Versioned envelope for the persisted record list.
#[derive(Serialize, Deserialize)]
struct HistoryDoc {
    version: u32,
    records: Vec<PeriodRecord>,
}

/// File-backed key-value map with shared/exclusive locking and atomic saves.
#[derive(Clone, Debug)]
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the full map with a shared lock.
    ///
    /// Missing, unreadable, or unparseable files all return an empty map;
    /// the failure is logged and swallowed so a damaged store never takes
    /// the statistics views down with it.
    fn load_map(&self) -> HashMap<String, Value> {
        if !self.path.exists() {
            return HashMap::new();
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open preferences {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                return HashMap::new();
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock preferences {:?}: {}. Treating as empty.",
                self.path,
                e
            );
            return HashMap::new();
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read preferences {:?}: {}. Treating as empty.",
                self.path,
                e
            );
            return HashMap::new();
        }
        let _ = file.unlock();

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse preferences {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                HashMap::new()
            }
        }
    }

    /// Atomically replace the map on disk: write to a locked temp file in
    /// the same directory, sync, then rename over the original.
    fn save_map(&self, map: &HashMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "preferences path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path)
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Saved preferences to {:?}", self.path);
        Ok(())
    }

    /// Read a single value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.load_map().get(key).cloned()
    }

    /// Load the map, let `f` mutate it, and save it back atomically.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, Value>),
    {
        let mut map = self.load_map();
        f(&mut map);
        self.save_map(&map)
    }
}

/// Typed, user-scoped access to one profile's cycle data.
///
/// `save_history` is the single mutation point that keeps the cached
/// averages and last period date consistent with the record list. There is
/// no cross-process merge: two writers racing on the same profile resolve to
/// whichever `save_history` lands last.
#[derive(Clone, Debug)]
pub struct CycleStore {
    prefs: PrefStore,
    user_key: String,
}

impl CycleStore {
    /// Open (lazily) the store for one user profile under `data_dir`.
    pub fn open(data_dir: &Path, user_key: impl Into<String>) -> Self {
        Self {
            prefs: PrefStore::new(data_dir.join(PREFS_FILE)),
            user_key: user_key.into(),
        }
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    fn scoped(&self, name: &str) -> String {
        format!("{}/{}", self.user_key, name)
    }

    /// All records for this user, in stored order. Empty if none exist or
    /// the stored value is corrupt or from an unknown schema version.
    pub fn history(&self) -> Vec<PeriodRecord> {
        let Some(value) = self.prefs.get(&self.scoped(HISTORY_KEY)) else {
            return Vec::new();
        };

        match serde_json::from_value::<HistoryDoc>(value) {
            Ok(doc) if doc.version == HISTORY_VERSION => doc.records,
            Ok(doc) => {
                tracing::warn!(
                    "Unknown history schema version {} for user {}. Treating as empty.",
                    doc.version,
                    self.user_key
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Corrupt history for user {}: {}. Treating as empty.",
                    self.user_key,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the full record list and refresh the derived values:
    /// average cycle length (with at least 2 records), average period length
    /// (with at least 1), and the most recent record's start date. Averages
    /// below their record threshold are left as previously stored.
    pub fn save_history(&self, records: &[PeriodRecord]) -> Result<()> {
        let doc = HistoryDoc {
            version: HISTORY_VERSION,
            records: records.to_vec(),
        };
        let history_value = serde_json::to_value(&doc)?;

        let avg_cycle = predictor::average_cycle_length(records);
        let avg_period = predictor::average_period_length(records);
        let last_start = predictor::latest_record(records).map(|r| r.start_date);

        self.prefs.update(|map| {
            map.insert(self.scoped(HISTORY_KEY), history_value);
            if let Some(days) = avg_cycle {
                map.insert(self.scoped(AVG_CYCLE_KEY), days.into());
            }
            if let Some(days) = avg_period {
                map.insert(self.scoped(AVG_PERIOD_KEY), days.into());
            }
            match last_start {
                Some(date) => {
                    map.insert(
                        self.scoped(LAST_PERIOD_KEY),
                        Value::String(date.to_string()),
                    );
                }
                None => {
                    map.remove(&self.scoped(LAST_PERIOD_KEY));
                }
            }
        })?;

        tracing::debug!(
            "Saved {} period records for user {}",
            records.len(),
            self.user_key
        );
        Ok(())
    }

    /// Stored settings, or the 28/5 defaults where unset.
    pub fn settings(&self) -> CycleSettings {
        let defaults = CycleSettings::default();
        CycleSettings {
            average_cycle_length: self
                .get_u32(AVG_CYCLE_KEY)
                .unwrap_or(defaults.average_cycle_length),
            average_period_length: self
                .get_u32(AVG_PERIOD_KEY)
                .unwrap_or(defaults.average_period_length),
        }
    }

    /// The explicit "set cycle length" user action. The only settings write
    /// that does not go through `save_history`.
    pub fn set_average_cycle_length(&self, days: u32) -> Result<()> {
        self.prefs.update(|map| {
            map.insert(self.scoped(AVG_CYCLE_KEY), days.into());
        })
    }

    /// Cached start date of the most recent period, maintained by
    /// `save_history`.
    pub fn last_period_date(&self) -> Option<NaiveDate> {
        self.prefs
            .get(&self.scoped(LAST_PERIOD_KEY))?
            .as_str()?
            .parse()
            .ok()
    }

    fn get_u32(&self, name: &str) -> Option<u32> {
        self.prefs
            .get(&self.scoped(name))?
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(y: i32, m: u32, d: u32, duration: u32) -> PeriodRecord {
        PeriodRecord::new(date(y, m, d), duration)
    }

    #[test]
    fn test_history_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        let records = vec![record(2024, 6, 10, 5), record(2024, 7, 8, 5)];
        store.save_history(&records).unwrap();

        assert_eq!(store.history(), records);
    }

    #[test]
    fn test_empty_store_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        assert!(store.history().is_empty());
        assert_eq!(store.settings(), CycleSettings::default());
        assert!(store.last_period_date().is_none());
    }

    #[test]
    fn test_save_history_updates_averages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store
            .save_history(&[record(2024, 6, 10, 5), record(2024, 7, 8, 5)])
            .unwrap();

        let settings = store.settings();
        assert_eq!(settings.average_cycle_length, 28);
        assert_eq!(settings.average_period_length, 5);
        assert_eq!(store.last_period_date(), Some(date(2024, 7, 8)));
    }

    #[test]
    fn test_single_record_keeps_cycle_length_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store.save_history(&[record(2024, 6, 10, 4)]).unwrap();

        let settings = store.settings();
        // One record cannot produce a cycle length; the default stands.
        assert_eq!(settings.average_cycle_length, 28);
        assert_eq!(settings.average_period_length, 4);
    }

    #[test]
    fn test_clearing_history_keeps_averages_removes_last_date() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store
            .save_history(&[record(2024, 6, 10, 4), record(2024, 7, 9, 4)])
            .unwrap();
        store.save_history(&[]).unwrap();

        assert!(store.history().is_empty());
        assert!(store.last_period_date().is_none());
        // Previously computed averages stay in place.
        assert_eq!(store.settings().average_cycle_length, 29);
        assert_eq!(store.settings().average_period_length, 4);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(PREFS_FILE), "{ not json ]").unwrap();

        let store = CycleStore::open(temp_dir.path(), "ada@example.com");
        assert!(store.history().is_empty());
        assert_eq!(store.settings(), CycleSettings::default());

        // A save recovers the file.
        store.save_history(&[record(2024, 6, 10, 5)]).unwrap();
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_corrupt_history_value_treated_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store.set_average_cycle_length(30).unwrap();
        store
            .prefs
            .update(|map| {
                map.insert(
                    "ada@example.com/cycle_history".into(),
                    Value::String("garbage".into()),
                );
            })
            .unwrap();

        assert!(store.history().is_empty());
        // Other keys in the same file are unaffected.
        assert_eq!(store.settings().average_cycle_length, 30);
    }

    #[test]
    fn test_unknown_history_version_treated_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store
            .prefs
            .update(|map| {
                map.insert(
                    "ada@example.com/cycle_history".into(),
                    serde_json::json!({ "version": 99, "records": [] }),
                );
            })
            .unwrap();

        assert!(store.history().is_empty());
    }

    #[test]
    fn test_users_are_scoped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ada = CycleStore::open(temp_dir.path(), "ada@example.com");
        let grace = CycleStore::open(temp_dir.path(), "grace@example.com");

        ada.save_history(&[record(2024, 6, 10, 5)]).unwrap();
        ada.set_average_cycle_length(30).unwrap();

        assert!(grace.history().is_empty());
        assert_eq!(grace.settings().average_cycle_length, 28);
        assert_eq!(ada.history().len(), 1);
        assert_eq!(ada.settings().average_cycle_length, 30);
    }

    #[test]
    fn test_set_average_cycle_length() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = CycleStore::open(temp_dir.path(), "ada@example.com");

        store.set_average_cycle_length(32).unwrap();
        assert_eq!(store.settings().average_cycle_length, 32);
    }

    #[test]
    fn test_last_save_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = CycleStore::open(temp_dir.path(), "ada@example.com");
        let second = CycleStore::open(temp_dir.path(), "ada@example.com");

        first.save_history(&[record(2024, 6, 10, 5)]).unwrap();
        second.save_history(&[record(2024, 7, 8, 4)]).unwrap();

        let history = first.history();
        assert_eq!(history, vec![record(2024, 7, 8, 4)]);
    }
}
