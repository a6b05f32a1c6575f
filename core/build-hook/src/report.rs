//! Read-only reporting over the daily records.

use build_clock::{Clock, DailyCounterStore, DayTotal, StorageConfig, SystemClock};
use chrono::NaiveDate;

use crate::error::HookError;

pub fn total(config: &StorageConfig, date: Option<NaiveDate>) -> Result<(), HookError> {
    let date = date.unwrap_or_else(|| SystemClock.today());
    let total_seconds = DailyCounterStore::new(config.clone()).load(date)?;
    let day = DayTotal {
        date,
        total_seconds,
    };
    println!("{}", format_day(&day));
    Ok(())
}

pub fn history(config: &StorageConfig, json: bool) -> Result<(), HookError> {
    let days = DailyCounterStore::new(config.clone()).history()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    if days.is_empty() {
        println!("(no builds recorded in {})", config.root().display());
    }
    for day in &days {
        println!("{}", format_day(day));
    }
    Ok(())
}

fn format_day(day: &DayTotal) -> String {
    format!(
        "{} {} ({})",
        day.date.format("%Y-%m-%d"),
        day.total_seconds,
        format_seconds(day.total_seconds)
    )
}

fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
