//! Daily tip selection.
//!
//! A pure function of the snapshot: templates are checked in a fixed
//! priority order, with on-period states taking precedence over the
//! window-based ones.

use crate::types::{CycleSnapshot, FertilityStatus};

/// How close (in days) the projected period start has to be before the
/// pre-period tip kicks in.
const PERIOD_SOON_DAYS: i64 = 3;

/// Pick today's tip for the given snapshot.
pub fn daily_tip(snapshot: &CycleSnapshot) -> &'static str {
    if !snapshot.has_data {
        return "Track your period to get personalized tips and predictions.";
    }

    if snapshot.is_on_period {
        if let Some(last) = snapshot.last_period {
            return on_period_tip(snapshot.current_cycle_day, i64::from(last.duration_days));
        }
    }

    if snapshot.fertility_status == FertilityStatus::High {
        return "You're in your fertile window. This is the best time to conceive if you're trying to get pregnant.";
    }

    if snapshot.days_until_next_period <= PERIOD_SOON_DAYS {
        return "Your period is coming soon. You might experience PMS symptoms like bloating or mood changes.";
    }

    if snapshot.fertility_status == FertilityStatus::Medium && snapshot.days_until_ovulation > 0 {
        return "Ovulation is a few days away. You may notice rising energy levels.";
    }

    "You're in the follicular phase. This is a good time for exercise and productivity."
}

/// On-period tips, split by where today falls within the period.
fn on_period_tip(day: i64, duration: i64) -> &'static str {
    if day <= 1 {
        "Your period just started. Take it easy today and keep something warm handy for cramps."
    } else if day >= duration {
        "Your period is wrapping up. Energy levels usually pick up from here."
    } else if day <= duration / 2 {
        "You're on your period. Make sure to stay hydrated and get enough rest."
    } else {
        "The heaviest days are likely behind you. Light movement can help with lingering cramps."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CycleSettings, PeriodRecord};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot_for(start: NaiveDate, duration: u32, today: NaiveDate) -> CycleSnapshot {
        crate::predictor::snapshot(
            &[PeriodRecord::new(start, duration)],
            &CycleSettings::default(),
            today,
        )
    }

    #[test]
    fn test_no_data_tip() {
        let tip = daily_tip(&CycleSnapshot::default());
        assert!(tip.contains("Track your period"));
    }

    #[test]
    fn test_on_period_day_splits() {
        let start = date(2024, 7, 8);

        let first = daily_tip(&snapshot_for(start, 6, date(2024, 7, 8)));
        assert!(first.contains("just started"));

        let early = daily_tip(&snapshot_for(start, 6, date(2024, 7, 9)));
        assert!(early.contains("stay hydrated"));

        let late = daily_tip(&snapshot_for(start, 6, date(2024, 7, 12)));
        assert!(late.contains("heaviest days"));

        let last = daily_tip(&snapshot_for(start, 6, date(2024, 7, 13)));
        assert!(last.contains("wrapping up"));
    }

    #[test]
    fn test_fertile_window_tip() {
        // Period 2024-07-08, ovulation projected 2024-07-22.
        let tip = daily_tip(&snapshot_for(date(2024, 7, 8), 5, date(2024, 7, 21)));
        assert!(tip.contains("fertile window"));
    }

    #[test]
    fn test_on_period_beats_fertile_window() {
        // A long record keeps today inside the period even at high
        // fertility; the on-period tip must win.
        let tip = daily_tip(&snapshot_for(date(2024, 7, 8), 14, date(2024, 7, 21)));
        assert!(tip.contains("wrapping up"));
    }

    #[test]
    fn test_period_soon_tip() {
        // Period 2024-07-08, next projected 2024-08-05.
        let tip = daily_tip(&snapshot_for(date(2024, 7, 8), 5, date(2024, 8, 3)));
        assert!(tip.contains("coming soon"));
    }

    #[test]
    fn test_approaching_ovulation_tip() {
        // Ovulation projected 2024-07-22; 4 days out is Medium fertility.
        let tip = daily_tip(&snapshot_for(date(2024, 7, 8), 5, date(2024, 7, 18)));
        assert!(tip.contains("Ovulation is a few days away"));
    }

    #[test]
    fn test_follicular_tip() {
        // Day 8 of the cycle: past the period, before any window.
        let tip = daily_tip(&snapshot_for(date(2024, 7, 8), 5, date(2024, 7, 15)));
        assert!(tip.contains("follicular"));
    }
}
