//! Chat endpoint metadata and resolution.
//!
//! The cabin talks to one OpenAI-compatible endpoint. Base URL and model can
//! be overridden (CLI flag > environment > settings file > default); the
//! sampling temperature cannot.

use serde::{Deserialize, Serialize};

use super::prompts::{MODEL, TEMPERATURE};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
pub const BASE_URL_ENV: &str = "DEEPSEEK_BASE_URL";
pub const MODEL_ENV: &str = "DEEPSEEK_MODEL";

/// Provider metadata shown by `settings show`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub env_key: String,
    pub default_base_url: String,
    pub default_model: String,
}

pub fn provider_info() -> ProviderInfo {
    ProviderInfo {
        id: "deepseek".to_string(),
        name: "DeepSeek Chat — JSON mode".to_string(),
        env_key: API_KEY_ENV.to_string(),
        default_base_url: DEFAULT_BASE_URL.to_string(),
        default_model: MODEL.to_string(),
    }
}

/// Where and how to send chat completions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: MODEL.to_string(),
            temperature: TEMPERATURE,
        }
    }
}

impl Endpoint {
    /// First non-blank candidate wins for each field.
    pub fn resolve(base_urls: &[Option<String>], models: &[Option<String>]) -> Self {
        Self {
            base_url: pick(base_urls, DEFAULT_BASE_URL),
            model: pick(models, MODEL),
            temperature: TEMPERATURE,
        }
    }

    /// Endpoint pointed at a different base URL (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn pick(candidates: &[Option<String>], default: &str) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Show only the last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "...".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_first_non_blank() {
        let endpoint = Endpoint::resolve(
            &[None, Some("  ".to_string()), Some("http://proxy".to_string())],
            &[Some("deepseek-reasoner".to_string())],
        );
        assert_eq!(endpoint.base_url, "http://proxy");
        assert_eq!(endpoint.model, "deepseek-reasoner");
        assert_eq!(endpoint.temperature, TEMPERATURE);
    }

    #[test]
    fn resolve_falls_back_to_defaults() {
        assert_eq!(Endpoint::resolve(&[None], &[None]), Endpoint::default());
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let endpoint = Endpoint::with_base_url("http://127.0.0.1:1234/");
        assert_eq!(endpoint.completions_url(), "http://127.0.0.1:1234/chat/completions");
    }

    #[test]
    fn mask_key_keeps_tail_only() {
        assert_eq!(mask_key("sk-1234567890abcd"), "...abcd");
        assert_eq!(mask_key("abc"), "...");
    }
}
