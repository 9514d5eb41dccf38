//! CLI command implementations

pub mod chat;
pub mod digest;
pub mod remind;
pub mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use hisobot_core::adapters::{CsvStore, GeminiClient, OfflineClassifier};
use hisobot_core::config::Config;
use hisobot_core::ports::{Analyst, LabelClassifier, Messenger};
use hisobot_core::services::{EventLog, LogEvent};
use hisobot_core::HisobotContext;

use crate::output::ConsoleMessenger;

/// Get the hisobot directory from environment or default
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HISOBOT_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".hisobot")
    }
}

/// Get the event log for CLI operations
///
/// Returns None if the data directory cannot be created (logging
/// should never block operations)
pub fn get_event_log() -> Option<EventLog> {
    let dir = get_data_dir();
    std::fs::create_dir_all(&dir).ok()?;
    Some(EventLog::new(&dir))
}

/// Log an event, ignoring any errors
pub fn log_event(log: &Option<EventLog>, event: LogEvent) {
    if let Some(l) = log {
        let _ = l.log(event);
    }
}

/// Get or create the hisobot context over the CSV store
pub fn get_context() -> Result<HisobotContext> {
    let dir = get_data_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create hisobot directory: {:?}", dir))?;

    let config = Config::load(&dir).context("Failed to load settings")?;
    let store = Arc::new(CsvStore::open(&dir).context("Failed to open ledger store")?);

    // without an API key only the local classification rules run
    let (classifier, analyst): (Arc<dyn LabelClassifier>, Arc<dyn Analyst>) =
        match &config.gemini_api_key {
            Some(key) => {
                let client = Arc::new(
                    GeminiClient::new(key, &config.gemini_model)
                        .context("Failed to build Gemini client")?,
                );
                (client.clone(), client)
            }
            None => (Arc::new(OfflineClassifier), Arc::new(OfflineClassifier)),
        };

    let messenger: Arc<dyn Messenger> = Arc::new(ConsoleMessenger);

    HisobotContext::new(store, classifier, analyst, messenger, config)
        .context("Failed to initialize hisobot context")
}
