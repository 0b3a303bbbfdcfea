//! Error types shared by the reply pipeline and the session log.
//!
//! Every error here is terminal for one operator action only. None of them
//! is allowed to crash the process or touch the session log.

use crate::llm::decode::DecodeError;
use crate::llm::prompts::PromptError;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a single reply generation.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// No API key resolved. Raised before any network call.
    #[error("未配置 API Key")]
    MissingApiKey,

    #[error("用户评论内容为空")]
    EmptyComment,

    #[error("提示词模板错误: {0}")]
    Prompt(#[from] PromptError),

    /// Endpoint unreachable, non-2xx, or an envelope without a completion.
    #[error("API 调用失败: {0}")]
    Network(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ReplyError {
    /// The error object shown to the operator.
    ///
    /// Decode failures keep the raw model output so it can be read by hand.
    pub fn to_error_object(&self) -> Value {
        match self {
            ReplyError::Decode(e) => e.to_sentinel(),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// Failure of a CSV export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("暂无记录")]
    EmptyLog,

    #[error("写入文件失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_error_object_has_only_message() {
        let obj = ReplyError::MissingApiKey.to_error_object();
        assert_eq!(obj["error"], "未配置 API Key");
        assert!(obj.get("raw_content").is_none());
    }

    #[test]
    fn network_error_message_is_verbatim() {
        let err = ReplyError::Network("503 Service Unavailable".to_string());
        assert_eq!(err.to_string(), "API 调用失败: 503 Service Unavailable");
    }

    #[test]
    fn decode_error_object_is_the_sentinel() {
        let err = ReplyError::from(DecodeError::new("oops"));
        let obj = err.to_error_object();
        assert_eq!(obj["error"], "JSON 解析失败");
        assert_eq!(obj["raw_content"], "oops");
    }
}
