use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use luna_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "luna")]
#[command(about = "Personal cycle tracking and prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User profile key (e.g. an email address)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's cycle snapshot and tip (default)
    Status,

    /// Log a period by start and end date, or by duration
    Log {
        /// First bleeding day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last bleeding day, inclusive
        #[arg(long, conflicts_with = "days")]
        end: Option<NaiveDate>,

        /// Duration in days (defaults to 1 when no end date is given)
        #[arg(long)]
        days: Option<u32>,
    },

    /// List logged periods, newest first, with cycle lengths
    History,

    /// Project future period and ovulation dates
    Predict {
        /// Number of cycles to project
        #[arg(long)]
        count: Option<u32>,
    },

    /// Show averages and regularity scores
    Stats,

    /// Change the end date of the period starting on the given date
    Edit {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,
    },

    /// Delete the period starting on the given date
    Delete {
        #[arg(long)]
        start: NaiveDate,
    },

    /// Delete all logged periods for the profile
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Set the average cycle length used for predictions
    SetCycleLength {
        /// Days between period starts (21-35)
        days: u32,
    },

    /// Export history as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    luna_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli
        .user
        .or_else(|| config.profile.default_user.clone())
        .unwrap_or_else(|| "default".to_string());

    tracing::debug!("Using data dir {:?}, profile {}", data_dir, user);

    let tracker = CycleTracker::open(&data_dir, user);
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&tracker, today),
        Some(Commands::Log { start, end, days }) => cmd_log(&tracker, start, end, days),
        Some(Commands::History) => cmd_history(&tracker),
        Some(Commands::Predict { count }) => {
            cmd_predict(&tracker, count.unwrap_or(config.prediction.horizon))
        }
        Some(Commands::Stats) => cmd_stats(&tracker),
        Some(Commands::Edit { start, end }) => cmd_edit(&tracker, start, end),
        Some(Commands::Delete { start }) => cmd_delete(&tracker, start),
        Some(Commands::Clear { yes }) => cmd_clear(&tracker, yes),
        Some(Commands::SetCycleLength { days }) => cmd_set_cycle_length(&tracker, days),
        Some(Commands::Export { out }) => cmd_export(&tracker, out),
    }
}

fn cmd_status(tracker: &CycleTracker, today: NaiveDate) -> Result<()> {
    let snapshot = tracker.snapshot(today);

    if !snapshot.has_data {
        println!("No period data yet. Log one with `luna log --start <date> --end <date>`.");
        println!("Tip: {}", daily_tip(&snapshot));
        return Ok(());
    }

    println!("Cycle day: {}", snapshot.current_cycle_day);

    if snapshot.is_on_period {
        println!(
            "On period: day {} ({}% through)",
            snapshot.current_cycle_day, snapshot.period_progress_percent
        );
    }

    if snapshot.days_until_next_period == 0 {
        println!("Next period: expected today");
    } else {
        println!("Next period: in {} days", snapshot.days_until_next_period);
    }

    if snapshot.days_until_ovulation.abs() <= 2 {
        println!("Ovulation: now");
    } else if snapshot.days_until_ovulation > 0 {
        println!("Ovulation: in {} days", snapshot.days_until_ovulation);
    } else {
        println!("Ovulation: {} days ago", -snapshot.days_until_ovulation);
    }

    println!("Fertility: {}", snapshot.fertility_status);
    println!("Tip: {}", daily_tip(&snapshot));
    Ok(())
}

fn cmd_log(
    tracker: &CycleTracker,
    start: NaiveDate,
    end: Option<NaiveDate>,
    days: Option<u32>,
) -> Result<()> {
    // Overlap is a caller-level concern; point it out but do not block.
    let prospective_end = match (end, days) {
        (Some(end), _) => end,
        (None, days) => start + chrono::Duration::days(i64::from(days.unwrap_or(1)) - 1),
    };
    if prospective_end >= start {
        warn_on_overlap(tracker, start, prospective_end);
    }

    let record = match (end, days) {
        (Some(end), _) => tracker.add_period_with_dates(start, end)?,
        (None, days) => tracker.add_period(start, days.unwrap_or(1))?,
    };

    println!(
        "Logged period {} - {} ({} days)",
        record.start_date,
        record.end_date(),
        record.duration_days
    );
    Ok(())
}

fn warn_on_overlap(tracker: &CycleTracker, start: NaiveDate, end: NaiveDate) {
    let overlapping = tracker
        .history()
        .into_iter()
        .find(|r| r.start_date != start && start <= r.end_date() && end >= r.start_date);

    if let Some(existing) = overlapping {
        println!(
            "Warning: overlaps the period logged {} - {}.",
            existing.start_date,
            existing.end_date()
        );
    }
}

fn cmd_history(tracker: &CycleTracker) -> Result<()> {
    let history = tracker.history();

    if history.is_empty() {
        println!("No period data yet.");
        return Ok(());
    }

    for row in cycle_rows(&history) {
        match row.cycle_length_days {
            Some(length) => println!(
                "{} - {}  {} days  (cycle: {} days)",
                row.start_date, row.end_date, row.duration_days, length
            ),
            None => println!(
                "{} - {}  {} days",
                row.start_date, row.end_date, row.duration_days
            ),
        }
    }

    let settings = tracker.settings();
    println!();
    println!("Average cycle: {} days", settings.average_cycle_length);
    println!("Average period: {} days", settings.average_period_length);
    println!(
        "Cycle regularity: {}%",
        predictor::cycle_regularity_score(&history)
    );
    Ok(())
}

fn cmd_predict(tracker: &CycleTracker, count: u32) -> Result<()> {
    let history = tracker.history();
    let settings = tracker.settings();

    let periods = predictor::predicted_period_spans(&history, &settings, count);
    if periods.is_empty() {
        println!("Mark your period to get predictions.");
        return Ok(());
    }

    println!("Next periods:");
    for (from, to) in &periods {
        println!("  {} - {}", from, to);
    }

    println!("Ovulation days:");
    for date in predictor::predicted_ovulation_dates(&history, &settings, count) {
        println!("  {}", date);
    }

    println!("Fertile windows:");
    for (from, to) in predictor::predicted_fertile_windows(&history, &settings, count) {
        println!("  {} - {}", from, to);
    }
    Ok(())
}

fn cmd_stats(tracker: &CycleTracker) -> Result<()> {
    let history = tracker.history();

    if history.is_empty() {
        println!("No period data yet.");
        return Ok(());
    }

    let settings = tracker.settings();
    let lengths = predictor::cycle_lengths(&history);

    println!("Periods logged: {}", history.len());
    println!("Cycles observed: {}", lengths.len());
    println!("Average cycle: {} days", settings.average_cycle_length);
    println!("Average period: {} days", settings.average_period_length);
    println!(
        "Cycle regularity: {}% within 21-35 days",
        predictor::cycle_regularity_score(&history)
    );
    println!(
        "Period regularity: {}% within 3-7 days",
        predictor::period_duration_regularity_score(&history)
    );
    Ok(())
}

fn cmd_edit(tracker: &CycleTracker, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let record = tracker.update_period_end_date(start, end)?;
    println!(
        "Updated period {} - {} ({} days)",
        record.start_date,
        record.end_date(),
        record.duration_days
    );
    Ok(())
}

fn cmd_delete(tracker: &CycleTracker, start: NaiveDate) -> Result<()> {
    let record = tracker.delete_period(start)?;
    println!(
        "Deleted period {} - {}",
        record.start_date,
        record.end_date()
    );
    Ok(())
}

fn cmd_clear(tracker: &CycleTracker, yes: bool) -> Result<()> {
    if !yes {
        print!(
            "This removes all logged periods for {}. Type 'yes' to confirm: ",
            tracker.store().user_key()
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if answer.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    tracker.clear_history()?;
    println!("All period data cleared.");
    Ok(())
}

fn cmd_set_cycle_length(tracker: &CycleTracker, days: u32) -> Result<()> {
    // 21-35 is the typical clinical range; reject anything else up front.
    if !(21..=35).contains(&days) {
        return Err(Error::Config(format!(
            "cycle length must be between 21 and 35 days, got {}",
            days
        )));
    }

    tracker.set_average_cycle_length(days)?;
    println!("Cycle length set to {} days.", days);
    Ok(())
}

fn cmd_export(tracker: &CycleTracker, out: Option<PathBuf>) -> Result<()> {
    let history = tracker.history();

    match out {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            export_csv(file, &history)?;
            println!("Exported {} records to {:?}", history.len(), path);
        }
        None => {
            export_csv(io::stdout().lock(), &history)?;
        }
    }
    Ok(())
}
