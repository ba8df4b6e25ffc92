//! Pure cycle statistics and predictions.
//!
//! Every function here is deterministic over `(history, settings, today)`.
//! `today` is always an explicit parameter; nothing in this module reads the
//! wall clock, so all derivations are directly testable with fixed dates.

use crate::types::{
    CycleSettings, CycleSnapshot, FertilityStatus, PeriodRecord, LUTEAL_PHASE_DAYS,
    NORMAL_CYCLE_MAX, NORMAL_CYCLE_MIN, NORMAL_DURATION_MAX, NORMAL_DURATION_MIN,
};
use chrono::{Duration, NaiveDate};

/// The record with the latest `start_date`, if any.
pub fn latest_record(history: &[PeriodRecord]) -> Option<&PeriodRecord> {
    history.iter().max_by_key(|r| r.start_date)
}

/// Derive the "today" view from a history snapshot plus settings.
///
/// Returns the default (all-zero, `has_data = false`) snapshot for an empty
/// history. `days_until_next_period` is clamped to non-negative for display;
/// `days_until_ovulation` is left signed so fertility banding and tips can
/// tell "just passed" from "coming up".
pub fn snapshot(
    history: &[PeriodRecord],
    settings: &CycleSettings,
    today: NaiveDate,
) -> CycleSnapshot {
    let Some(last) = latest_record(history) else {
        return CycleSnapshot::default();
    };

    let days_since = (today - last.start_date).num_days();
    let current_cycle_day = days_since + 1;

    let next_period_start = last.start_date + Duration::days(i64::from(settings.average_cycle_length));
    let days_until_next_period = (next_period_start - today).num_days().max(0);

    let ovulation_date = next_period_start - Duration::days(LUTEAL_PHASE_DAYS);
    let days_until_ovulation = (ovulation_date - today).num_days();

    let is_on_period = last.contains(today);
    let period_progress_percent = if is_on_period {
        let elapsed = days_since + 1;
        ((elapsed * 100) / i64::from(last.duration_days)).min(100) as u8
    } else {
        0
    };

    CycleSnapshot {
        has_data: true,
        current_cycle_day,
        days_until_next_period,
        days_until_ovulation,
        fertility_status: fertility_status(days_until_ovulation),
        is_on_period,
        period_progress_percent,
        last_period: Some(*last),
        average_cycle_length: settings.average_cycle_length,
    }
}

/// Fertility band for a signed distance to predicted ovulation.
pub fn fertility_status(days_until_ovulation: i64) -> FertilityStatus {
    match days_until_ovulation {
        -2..=2 => FertilityStatus::High,
        -5..=5 => FertilityStatus::Medium,
        _ => FertilityStatus::Low,
    }
}

/// Day counts between chronologically adjacent period starts.
///
/// This is the canonical definition of "one cycle": the history is sorted
/// ascending by `start_date` and each adjacent pair contributes one length.
/// Fewer than two records yield an empty list.
pub fn cycle_lengths(history: &[PeriodRecord]) -> Vec<i64> {
    if history.len() < 2 {
        return Vec::new();
    }

    let mut sorted = history.to_vec();
    sorted.sort_by_key(|r| r.start_date);
    sorted
        .windows(2)
        .map(|pair| (pair[1].start_date - pair[0].start_date).num_days())
        .collect()
}

/// Round-half-up mean of observed cycle lengths; `None` below two records.
pub fn average_cycle_length(history: &[PeriodRecord]) -> Option<u32> {
    let lengths = cycle_lengths(history);
    if lengths.is_empty() {
        return None;
    }
    Some(round_mean(&lengths))
}

/// Round-half-up mean of period durations; `None` for an empty history.
pub fn average_period_length(history: &[PeriodRecord]) -> Option<u32> {
    if history.is_empty() {
        return None;
    }
    let durations: Vec<i64> = history.iter().map(|r| i64::from(r.duration_days)).collect();
    Some(round_mean(&durations))
}

/// Projected start dates for the next `count` periods.
///
/// Each is `last.start_date + average_cycle_length * i`. Empty without
/// history.
pub fn predicted_period_dates(
    history: &[PeriodRecord],
    settings: &CycleSettings,
    count: u32,
) -> Vec<NaiveDate> {
    let Some(last) = latest_record(history) else {
        return Vec::new();
    };

    let cycle = i64::from(settings.average_cycle_length);
    (1..=i64::from(count))
        .map(|i| last.start_date + Duration::days(cycle * i))
        .collect()
}

/// Projected ovulation dates: each predicted period start minus the luteal
/// phase. Same cardinality and emptiness rule as the period predictions.
pub fn predicted_ovulation_dates(
    history: &[PeriodRecord],
    settings: &CycleSettings,
    count: u32,
) -> Vec<NaiveDate> {
    predicted_period_dates(history, settings, count)
        .into_iter()
        .map(|d| d - Duration::days(LUTEAL_PHASE_DAYS))
        .collect()
}

/// Each predicted period expanded to its full expected span, using the
/// average period length: `(start, start + length - 1)`.
pub fn predicted_period_spans(
    history: &[PeriodRecord],
    settings: &CycleSettings,
    count: u32,
) -> Vec<(NaiveDate, NaiveDate)> {
    let span = i64::from(settings.average_period_length.max(1)) - 1;
    predicted_period_dates(history, settings, count)
        .into_iter()
        .map(|d| (d, d + Duration::days(span)))
        .collect()
}

/// The 9-day fertile window around each predicted ovulation: from 17 days
/// before the period start through 9 days before it.
pub fn predicted_fertile_windows(
    history: &[PeriodRecord],
    settings: &CycleSettings,
    count: u32,
) -> Vec<(NaiveDate, NaiveDate)> {
    predicted_period_dates(history, settings, count)
        .into_iter()
        .map(|d| {
            (
                d - Duration::days(LUTEAL_PHASE_DAYS + 3),
                d - Duration::days(LUTEAL_PHASE_DAYS - 5),
            )
        })
        .collect()
}

/// Percentage of observed cycle lengths inside the normal 21-35 day range,
/// rounded to the nearest integer. 0 with fewer than two records.
pub fn cycle_regularity_score(history: &[PeriodRecord]) -> u8 {
    let lengths = cycle_lengths(history);
    if lengths.is_empty() {
        return 0;
    }

    let normal = lengths
        .iter()
        .filter(|&&l| (NORMAL_CYCLE_MIN..=NORMAL_CYCLE_MAX).contains(&l))
        .count();
    round_percent(normal, lengths.len())
}

/// Percentage of period durations inside the normal 3-7 day range, rounded.
/// 0 for an empty history.
pub fn period_duration_regularity_score(history: &[PeriodRecord]) -> u8 {
    if history.is_empty() {
        return 0;
    }

    let normal = history
        .iter()
        .filter(|r| (NORMAL_DURATION_MIN..=NORMAL_DURATION_MAX).contains(&i64::from(r.duration_days)))
        .count();
    round_percent(normal, history.len())
}

fn round_mean(values: &[i64]) -> u32 {
    let sum: i64 = values.iter().sum();
    let mean = sum as f64 / values.len() as f64;
    mean.round().max(0.0) as u32
}

fn round_percent(part: usize, total: usize) -> u8 {
    ((part as f64 / total as f64) * 100.0).round() as u8
}
