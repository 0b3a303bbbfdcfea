//! Session log — append-only record of successful generations.
//!
//! Entries are only ever pushed; nothing edits or removes them. The log
//! lives as long as its `Session` and is exported as UTF-8 CSV with a BOM
//! so spreadsheet tools pick the right encoding.

use crate::error::ExportError;
use crate::llm::{ReplyRequest, StructuredReply};
use std::path::Path;

/// Byte-order mark prepended to CSV exports.
const UTF8_BOM: &str = "\u{feff}";

/// Written to the adopted-style column; the operator copies a style by hand.
pub const ADOPTED_PENDING: &str = "待定(请手动复制)";

pub const CSV_HEADERS: [&str; 5] = ["时间", "模式", "用户内容", "心理洞察/情绪诊断", "采纳方案"];

/// One successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub mode: String,
    pub insight_or_diagnosis: String,
    pub content_preview: String,
    pub adopted_style: String,
}

impl LogEntry {
    pub fn new(request: &ReplyRequest, reply: &StructuredReply, timestamp: String) -> Self {
        Self {
            timestamp,
            mode: request.mode().label().to_string(),
            insight_or_diagnosis: reply.insight_or_diagnosis(),
            content_preview: request.preview(),
            adopted_style: ADOPTED_PENDING.to_string(),
        }
    }

    /// Entry stamped with the current local time as `HH:MM`.
    pub fn now(request: &ReplyRequest, reply: &StructuredReply) -> Self {
        Self::new(request, reply, chrono::Local::now().format("%H:%M").to_string())
    }

    fn csv_fields(&self) -> [&str; 5] {
        [
            self.timestamp.as_str(),
            self.mode.as_str(),
            self.content_preview.as_str(),
            self.insight_or_diagnosis.as_str(),
            self.adopted_style.as_str(),
        ]
    }
}

#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
        log::info!("[SESSION] Logged entry #{}", self.entries.len());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to CSV (BOM, header row, insertion order).
    ///
    /// An empty log is refused rather than producing a header-only file.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        if self.entries.is_empty() {
            return Err(ExportError::EmptyLog);
        }
        let mut out = String::from(UTF8_BOM);
        push_row(&mut out, &CSV_HEADERS);
        for entry in &self.entries {
            push_row(&mut out, &entry.csv_fields());
        }
        Ok(out)
    }

    /// Write the CSV export to `path`. Nothing is written for an empty log.
    pub fn export_csv(&self, path: &Path) -> Result<(), ExportError> {
        let csv = self.to_csv()?;
        std::fs::write(path, csv).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("[EXPORT] Wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// RFC 4180 quoting: wrap in quotes when needed and double inner quotes.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ReplyMode;
    use serde_json::json;

    fn entry(comment: &str, insight: &str, at: &str) -> LogEntry {
        let request = ReplyRequest::new(comment, None, ReplyMode::FastSop).unwrap();
        let reply =
            StructuredReply::from_value(ReplyMode::FastSop, json!({"insight": insight}), "")
                .unwrap();
        LogEntry::new(&request, &reply, at.to_string())
    }

    #[test]
    fn empty_log_refuses_export() {
        let log = SessionLog::new();
        assert!(matches!(log.to_csv(), Err(ExportError::EmptyLog)));
    }

    #[test]
    fn empty_log_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert!(SessionLog::new().export_csv(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn csv_starts_with_bom_and_header() {
        let mut log = SessionLog::new();
        log.append(entry("会员白充了", "想要解释", "09:15"));
        let csv = log.to_csv().unwrap();
        assert!(csv.starts_with('\u{feff}'));
        let mut lines = csv.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("时间,模式,用户内容,心理洞察/情绪诊断,采纳方案"));
        assert_eq!(
            lines.next(),
            Some("09:15,三维话术,会员白充了,想要解释,待定(请手动复制)")
        );
    }

    #[test]
    fn rows_keep_insertion_order() {
        let mut log = SessionLog::new();
        log.append(entry("first", "a", "09:00"));
        log.append(entry("second", "b", "09:01"));
        log.append(entry("third", "c", "09:02"));
        let previews: Vec<&str> = log
            .entries()
            .iter()
            .map(|e| e.content_preview.as_str())
            .collect();
        assert_eq!(previews, ["first", "second", "third"]);
        let csv = log.to_csv().unwrap();
        assert!(csv.find("first").unwrap() < csv.find("second").unwrap());
        assert!(csv.find("second").unwrap() < csv.find("third").unwrap());
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shanbay_replies.csv");
        let mut log = SessionLog::new();
        log.append(entry("卡死了", "愤怒", "10:30"));
        log.export_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("卡死了"));
    }
}
