//! Configuration surface — API key, endpoint and OCR resolution.
//!
//! Handles:
//! - API key resolution (build-time literal → env / OS keychain → prompt)
//! - API key storage (OS keychain via keyring crate)
//! - Endpoint connection testing
//! - Settings file overrides for endpoint and OCR engine

pub mod store;

use crate::llm::provider::{self, Endpoint, API_KEY_ENV, BASE_URL_ENV, MODEL_ENV};
use crate::ocr::{OcrConfig, DEFAULT_LANGUAGE};
use std::io::IsTerminal;

pub use store::{load_settings, save_settings, Settings};

const KEYRING_SERVICE: &str = "reply-cabin";
const KEYRING_USER: &str = "deepseek";

/// Key baked in at build time (`REPLY_CABIN_API_KEY=... cargo build`).
const BUILD_TIME_API_KEY: Option<&str> = option_env!("REPLY_CABIN_API_KEY");

// ── API key resolution ───────────────────────────────────────────────

/// Where the resolved API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    BuildTime,
    Environment,
    Keychain,
    Prompt,
}

impl KeySource {
    pub fn label(&self) -> &'static str {
        match self {
            KeySource::BuildTime => "内置",
            KeySource::Environment => "环境变量",
            KeySource::Keychain => "系统钥匙串",
            KeySource::Prompt => "手动输入",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

/// Try each tier in order; the first non-blank key wins. Later tiers are
/// not consulted once a key is found.
pub fn resolve_with(tiers: &[(KeySource, &dyn Fn() -> Option<String>)]) -> Option<ResolvedKey> {
    tiers.iter().find_map(|(source, lookup)| {
        lookup()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|key| ResolvedKey {
                key,
                source: *source,
            })
    })
}

/// Resolve the API key. Prompts only when `allow_prompt` and stdin is a terminal.
pub fn resolve_api_key(allow_prompt: bool) -> Option<ResolvedKey> {
    let build_time = || BUILD_TIME_API_KEY.map(str::to_string);
    let environment = || std::env::var(API_KEY_ENV).ok();
    let keychain = keychain_get;
    let prompt = || {
        if allow_prompt && std::io::stdin().is_terminal() {
            prompt_for_key()
        } else {
            None
        }
    };

    let tiers: [(KeySource, &dyn Fn() -> Option<String>); 4] = [
        (KeySource::BuildTime, &build_time),
        (KeySource::Environment, &environment),
        (KeySource::Keychain, &keychain),
        (KeySource::Prompt, &prompt),
    ];
    let resolved = resolve_with(&tiers);
    match &resolved {
        Some(r) => log::info!(
            "[SETTINGS] API key from {:?} ({})",
            r.source,
            provider::mask_key(&r.key)
        ),
        None => log::warn!("[SETTINGS] No API key resolved"),
    }
    resolved
}

fn keychain_get() -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
    match entry.get_password() {
        Ok(key) => Some(key),
        Err(e) => {
            log::debug!("[SETTINGS] Keychain lookup failed: {}", e);
            None
        }
    }
}

fn prompt_for_key() -> Option<String> {
    dialoguer::Password::new()
        .with_prompt("DeepSeek API Key")
        .allow_empty_password(true)
        .interact()
        .ok()
}

/// Save an API key to the OS keychain.
pub fn save_api_key(api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key is empty".to_string());
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(api_key.trim())
        .map_err(|e| format!("Failed to save key: {}", e))?;
    log::info!("[SETTINGS] API key saved to OS keychain");
    Ok(())
}

// ── Endpoint and OCR resolution ──────────────────────────────────────

/// Effective endpoint: CLI flag > environment > settings file > default.
pub fn resolve_endpoint(
    settings: &Settings,
    cli_base_url: Option<String>,
    cli_model: Option<String>,
) -> Endpoint {
    Endpoint::resolve(
        &[
            cli_base_url,
            std::env::var(BASE_URL_ENV).ok(),
            settings.base_url.clone(),
        ],
        &[
            cli_model,
            std::env::var(MODEL_ENV).ok(),
            settings.model.clone(),
        ],
    )
}

pub fn ocr_config(settings: &Settings) -> OcrConfig {
    OcrConfig {
        binary: settings.tesseract_path.clone(),
        language: settings
            .ocr_language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
    }
}

/// Send a minimal completion and report whether the endpoint accepted it.
pub async fn test_endpoint(endpoint: &Endpoint, api_key: &str) -> Result<bool, String> {
    let resp = reqwest::Client::new()
        .post(endpoint.completions_url())
        .bearer_auth(api_key)
        .json(&serde_json::json!({
            "model": endpoint.model,
            "max_tokens": 5,
            "messages": [{"role": "user", "content": "Reply with just: ok"}]
        }))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let ok = resp.status().is_success();
    log::info!("[SETTINGS] Test {} — status: {}", endpoint.base_url, resp.status());
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Tier<'a> = (KeySource, &'a dyn Fn() -> Option<String>);

    #[test]
    fn first_non_blank_tier_wins() {
        let none = || None::<String>;
        let blank = || Some("   ".to_string());
        let keychain = || Some("sk-keychain".to_string());
        let tiers: [Tier; 3] = [
            (KeySource::BuildTime, &none),
            (KeySource::Environment, &blank),
            (KeySource::Keychain, &keychain),
        ];
        let resolved = resolve_with(&tiers).unwrap();
        assert_eq!(resolved.key, "sk-keychain");
        assert_eq!(resolved.source, KeySource::Keychain);
    }

    #[test]
    fn later_tiers_are_not_consulted() {
        let prompted = Cell::new(false);
        let build = || Some("sk-built-in".to_string());
        let prompt = || {
            prompted.set(true);
            Some("sk-typed".to_string())
        };
        let tiers: [Tier; 2] = [(KeySource::BuildTime, &build), (KeySource::Prompt, &prompt)];
        let resolved = resolve_with(&tiers).unwrap();
        assert_eq!(resolved.source, KeySource::BuildTime);
        assert!(!prompted.get());
    }

    #[test]
    fn key_is_trimmed() {
        let env = || Some(" sk-env \n".to_string());
        let tiers: [Tier; 1] = [(KeySource::Environment, &env)];
        assert_eq!(resolve_with(&tiers).unwrap().key, "sk-env");
    }

    #[test]
    fn no_tier_means_no_key() {
        let none = || None::<String>;
        let tiers: [Tier; 1] = [(KeySource::Environment, &none)];
        assert_eq!(resolve_with(&tiers), None);
    }

    #[test]
    fn ocr_config_defaults_language() {
        let config = ocr_config(&Settings::default());
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.binary, None);
    }

    #[test]
    fn cli_flag_beats_settings_file() {
        let settings = Settings {
            base_url: Some("http://from-file".to_string()),
            ..Default::default()
        };
        let endpoint = resolve_endpoint(&settings, Some("http://from-flag".to_string()), None);
        assert_eq!(endpoint.base_url, "http://from-flag");
    }
}
