//! Operator session — the one long-lived context object.
//!
//! Owns the chat client, the OCR recognizer and the session log. Created
//! once at startup and passed by reference to every action; nothing in the
//! crate keeps global mutable state.

pub mod log;

use crate::error::{ExportError, ReplyError};
use crate::llm::{generate_reply, ChatClient, Endpoint, ReplyRequest, StructuredReply};
use crate::ocr::{OcrConfig, Recognizer};
use image::DynamicImage;
use std::path::Path;

pub use self::log::{LogEntry, SessionLog};

/// Default file name for CSV exports.
pub const DEFAULT_EXPORT_FILE: &str = "shanbay_replies.csv";

pub struct Session {
    client: ChatClient,
    recognizer: Recognizer,
    log: SessionLog,
}

impl Session {
    pub fn new(endpoint: Endpoint, ocr: &OcrConfig) -> Self {
        ::log::info!(
            "[SESSION] Started (endpoint: {}, model: {})",
            endpoint.base_url,
            endpoint.model
        );
        Self {
            client: ChatClient::new(endpoint),
            recognizer: Recognizer::new(ocr),
            log: SessionLog::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.client.endpoint()
    }

    /// Generate a reply. Only a successful generation is logged.
    pub async fn generate(
        &mut self,
        request: &ReplyRequest,
        api_key: &str,
    ) -> Result<StructuredReply, ReplyError> {
        let reply = generate_reply(&self.client, request, api_key).await?;
        self.log.append(LogEntry::now(request, &reply));
        Ok(reply)
    }

    /// OCR a screenshot. Failures come back as a "识别出错: ..." string.
    pub fn extract_text(&self, image: &DynamicImage) -> String {
        self.recognizer.extract_text(image)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn export_csv(&self, path: &Path) -> Result<(), ExportError> {
        self.log.export_csv(path)
    }
}
