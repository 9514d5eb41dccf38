//! Interactive chat REPL
//!
//! Lines are routed exactly like inbound chat messages. A line prefixed
//! with `cb ` is treated as a button press and goes through the callback
//! path, e.g. `cb delete_last_transaction`.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use hisobot_core::services::LogEvent;

use super::{get_context, get_event_log, log_event};
use crate::output;

pub fn run(chat_id: Option<String>) -> Result<()> {
    let log = get_event_log();
    let ctx = get_context()?;

    let chat_id = match chat_id {
        Some(id) => id,
        None if !ctx.config.owner_chat_id.is_empty() => ctx.config.owner_chat_id.clone(),
        None => anyhow::bail!(
            "No chat id. Pass --chat-id or set app.ownerChatId in settings.json"
        ),
    };

    output::info(&format!(
        "Chatting as {chat_id}. Type a message, `cb <data>` for a button press, `exit` to quit."
    ));
    log_event(&log, LogEvent::new("cli_started").with_command("chat"));

    ctx.router
        .handle_message(&chat_id, "/start")
        .context("Failed to start session")?;

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let result = match line.strip_prefix("cb ") {
            Some(data) => ctx.router.handle_callback(&chat_id, data),
            None => ctx.router.handle_message(&chat_id, line),
        };

        if let Err(e) = result {
            log_event(&log, LogEvent::new("message_failed").with_error(e.to_string()));
            output::error(&format!("Error: {e}"));
        }
    }

    log_event(&log, LogEvent::new("cli_stopped").with_command("chat"));
    Ok(())
}
