use crate::error::{Result, SheetSentryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub spreadsheet_id: Option<String>,
    pub cookies: Option<String>,
    pub requests_delay_ms: u64,
    pub sound_file: Option<PathBuf>,
    pub rules_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SheetSentryError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("sheet-sentry").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            spreadsheet_id: None,
            cookies: None,
            requests_delay_ms: 30_000,
            sound_file: None,
            rules_file: None,
        }
    }

    pub fn get_spreadsheet_id(&self) -> Result<String> {
        // Environment takes priority
        if let Ok(id) = std::env::var("SHEET_SENTRY_SPREADSHEET_ID") {
            return Ok(id);
        }

        self.spreadsheet_id
            .clone()
            .ok_or(SheetSentryError::MissingSpreadsheetId)
    }

    pub fn get_cookies(&self) -> Result<String> {
        if let Ok(cookies) = std::env::var("SHEET_SENTRY_COOKIES") {
            return Ok(cookies);
        }

        self.cookies.clone().ok_or(SheetSentryError::MissingCookies)
    }

    pub fn set_spreadsheet_id(&mut self, id: String) -> Result<()> {
        self.spreadsheet_id = Some(id);
        self.save()
    }

    pub fn set_cookies(&mut self, cookies: String) -> Result<()> {
        self.cookies = Some(cookies);
        self.save()
    }
}
