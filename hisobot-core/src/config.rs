//! Configuration management
//!
//! settings.json in the data directory:
//! ```json
//! {
//!   "app": { "ownerChatId": "123456", "nearDueDays": 3 },
//!   "gemini": { "apiKey": "...", "model": "gemini-1.5-flash" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    gemini: GeminiSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    owner_chat_id: String,
    #[serde(default)]
    near_due_days: Option<i64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSettings {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: String,
}

/// Hisobot configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub owner_chat_id: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub near_due_days: i64,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_chat_id: String::new(),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            near_due_days: 3,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory.
    ///
    /// The owner chat id and API key can be overridden through the
    /// HISOBOT_OWNER_CHAT_ID and GEMINI_API_KEY environment variables.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let owner_chat_id = std::env::var("HISOBOT_OWNER_CHAT_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| raw.app.owner_chat_id.clone());

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| {
                let key = raw.gemini.api_key.clone();
                (!key.is_empty()).then_some(key)
            });

        let gemini_model = if raw.gemini.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            raw.gemini.model.clone()
        };

        Ok(Self {
            owner_chat_id,
            gemini_api_key,
            gemini_model,
            near_due_days: raw.app.near_due_days.unwrap_or(3),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving settings the CLI
    /// doesn't manage.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.owner_chat_id = self.owner_chat_id.clone();
        settings.app.near_due_days = Some(self.near_due_days);
        settings.gemini.api_key = self.gemini_api_key.clone().unwrap_or_default();
        settings.gemini.model = self.gemini_model.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.near_due_days, 3);
    }

    #[test]
    fn test_save_preserves_unmanaged_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"app": {"ownerChatId": "42", "theme": "dark"}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert_eq!(config.owner_chat_id, "42");

        config.near_due_days = 5;
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"theme\": \"dark\""));
        assert!(content.contains("\"nearDueDays\": 5"));
    }
}
