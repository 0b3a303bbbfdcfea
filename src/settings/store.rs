//! Settings file persistence.
//!
//! Optional overrides live in `{config_dir}/reply-cabin/settings.json`.
//! A missing or unreadable file means "all defaults"; it is never an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// Keys accepted by `settings set`.
pub const KNOWN_KEYS: [&str; 4] = ["base_url", "model", "tesseract_path", "ocr_language"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,
}

impl Settings {
    /// Set one key. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match key {
            "base_url" => self.base_url = value,
            "model" => self.model = value,
            "tesseract_path" => self.tesseract_path = value.map(PathBuf::from),
            "ocr_language" => self.ocr_language = value,
            other => {
                return Err(format!(
                    "Unknown setting: {}. Use one of: {}",
                    other,
                    KNOWN_KEYS.join(", ")
                ))
            }
        }
        Ok(())
    }
}

/// Directory holding the settings file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reply-cabin")
}

pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

/// Load settings from the default location.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Load settings from `path`, falling back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("[SETTINGS] Ignoring invalid {}: {}", path.display(), e);
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Persist settings to the default location.
pub fn save_settings(settings: &Settings) -> Result<(), String> {
    save_settings_to(&settings_path(), settings)
}

/// Persist settings to `path`, creating its directory if needed.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;
    log::info!("[SETTINGS] Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings_from(&dir.path().join("nope.json")), Settings::default());
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let mut settings = Settings::default();
        settings.set("base_url", "http://localhost:8080").unwrap();
        settings.set("ocr_language", "chi_sim").unwrap();
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn empty_value_clears_key() {
        let mut settings = Settings {
            model: Some("deepseek-reasoner".to_string()),
            ..Default::default()
        };
        settings.set("model", "  ").unwrap();
        assert_eq!(settings.model, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Settings::default().set("temperature", "1.0").unwrap_err();
        assert!(err.contains("Unknown setting: temperature"));
    }
}
