//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

use hisobot_core::ports::Messenger;
use hisobot_core::Result;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Messenger that prints outbound chat messages to the terminal
pub struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        println!("{}", format!("[{chat_id}]").dimmed());
        println!("{text}\n");
        Ok(())
    }
}
