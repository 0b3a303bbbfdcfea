//! Chat-completion call — one non-streamed request per generation.
//!
//! The request always carries the JSON response-format hint, `stream: false`
//! and the fixed temperature. There is no retry: a transport error or a
//! non-2xx status becomes `ReplyError::Network` with the message verbatim.

use crate::error::ReplyError;

use super::provider::Endpoint;

/// HTTP client for the chat endpoint. One per session.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl ChatClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send system + user messages and return the completion text.
    pub async fn complete(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ReplyError> {
        log::info!("[LLM] Model: {}", self.endpoint.model);
        let start = std::time::Instant::now();

        let response = self
            .http
            .post(self.endpoint.completions_url())
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.endpoint.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_text},
                ],
                "stream": false,
                "temperature": self.endpoint.temperature,
                "response_format": {"type": "json_object"},
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("[LLM] HTTP request failed: {}", e);
                ReplyError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[LLM] API returned {}: {}", status, body);
            return Err(ReplyError::Network(format!(
                "{}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReplyError::Network(format!("响应不是合法 JSON: {}", e)))?;

        log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());
        if let Some(usage) = body.get("usage") {
            log::info!(
                "[LLM] Tokens: prompt={} completion={}",
                usage["prompt_tokens"].as_u64().unwrap_or(0),
                usage["completion_tokens"].as_u64().unwrap_or(0)
            );
        }

        extract_content(&body)
    }
}

/// `choices[0].message.content` of an OpenAI-style completion.
pub(crate) fn extract_content(body: &serde_json::Value) -> Result<String, ReplyError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ReplyError::Network("响应中没有 choices[0].message.content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_choice_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "{}"}}]});
        assert_eq!(extract_content(&body).unwrap(), "{}");
    }

    #[test]
    fn missing_choices_is_a_network_error() {
        let err = extract_content(&json!({"error": {"message": "bad"}})).unwrap_err();
        assert!(matches!(err, ReplyError::Network(_)));
    }
}
