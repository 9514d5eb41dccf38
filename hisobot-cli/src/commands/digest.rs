//! Weekly digest push

use anyhow::{Context, Result};

use hisobot_core::services::LogEvent;

use super::{get_context, get_event_log, log_event};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let log = get_event_log();
    let ctx = get_context()?;

    let dict = ctx.category_service.dict();
    let report = ctx
        .reminder_service
        .run_weekly_digest(&dict)
        .context("Weekly digest failed")?;
    log_event(&log, LogEvent::new("weekly_digest").with_command("digest"));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::success(&format!(
        "Digest: {} owners checked, {} notified, {} skipped, {} failed",
        report.owners_checked, report.owners_notified, report.owners_skipped, report.owners_failed
    ));
    Ok(())
}
