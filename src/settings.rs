use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DepotError, Result};
use crate::numbers::NumberLocale;

pub const DB_FILE: &str = "depot.db";

/// Persisted at `~/.config/depot/settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `depot.db` and the `exports/` folder.
    pub data_dir: String,
    /// Decimal convention for amounts typed on the command line: "de", "en",
    /// or empty to detect it per value.
    #[serde(default)]
    pub number_locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            number_locale: String::new(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    pub fn locale(&self) -> Option<NumberLocale> {
        NumberLocale::from_key(&self.number_locale)
    }

    /// Set the amount locale. "auto" or "" switches back to detection.
    pub fn set_locale(&mut self, key: &str) -> Result<()> {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || key == "auto" {
            self.number_locale.clear();
            return Ok(());
        }
        if NumberLocale::from_key(&key).is_none() {
            return Err(DepotError::Settings(format!(
                "Unknown number locale {key:?} (expected de, en or auto)"
            )));
        }
        self.number_locale = key;
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("depot")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("depot")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| DepotError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn get_db_path() -> PathBuf {
    load_settings().db_path()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            number_locale: "de".to_string(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.locale(), Some(NumberLocale::De));
    }

    #[test]
    fn test_missing_locale_defaults_to_autodetect() {
        let s: Settings = serde_json::from_str(r#"{"data_dir": "/tmp/test"}"#).unwrap();
        assert_eq!(s.number_locale, "");
        assert_eq!(s.locale(), None);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.data_dir.ends_with("depot"));
        assert!(s.db_path().ends_with("depot/depot.db"));
        assert_eq!(s.locale(), None);
    }

    #[test]
    fn test_set_locale() {
        let mut s = Settings::default();
        s.set_locale(" EN ").unwrap();
        assert_eq!(s.number_locale, "en");
        assert_eq!(s.locale(), Some(NumberLocale::En));

        assert!(matches!(s.set_locale("fr"), Err(DepotError::Settings(_))));
        assert_eq!(s.locale(), Some(NumberLocale::En));

        s.set_locale("auto").unwrap();
        assert_eq!(s.locale(), None);
    }
}
