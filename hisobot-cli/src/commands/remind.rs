//! Daily reminder sweep

use anyhow::{Context, Result};
use chrono::Utc;

use hisobot_core::domain::parse::parse_date;
use hisobot_core::services::LogEvent;

use super::{get_context, get_event_log, log_event};
use crate::output;

pub fn run(date: Option<&str>, json: bool) -> Result<()> {
    let log = get_event_log();
    let ctx = get_context()?;

    let today = match date {
        Some(raw) => parse_date(raw).context("Invalid --date, expected DD.MM.YYYY")?,
        None => Utc::now().date_naive(),
    };

    let report = ctx
        .reminder_service
        .run_daily_sweep(today)
        .context("Reminder sweep failed")?;
    log_event(&log, LogEvent::new("daily_sweep").with_command("remind"));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::success(&format!(
        "Sweep for {today}: {} owners checked, {} notified, {} skipped, {} failed",
        report.owners_checked, report.owners_notified, report.owners_skipped, report.owners_failed
    ));
    Ok(())
}
