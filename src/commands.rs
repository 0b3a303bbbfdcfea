//! Simple one-step command handlers.
//!
//! Thin wrappers the console and the CLI call for a single action:
//! load a screenshot, copy a reply style, export the log.
//!
//! Multi-step flows live in pipeline.rs instead.

use crate::capture;
use crate::llm::{ReplyStyle, StructuredReply};
use crate::session::{Session, DEFAULT_EXPORT_FILE};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Where a screenshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Clipboard,
}

/// Load a screenshot from its source.
pub fn load_image(source: &ImageSource) -> Result<DynamicImage, String> {
    match source {
        ImageSource::File(path) => capture::load_from_path(path),
        ImageSource::Clipboard => capture::paste_from_clipboard(),
    }
    .map_err(|e| e.to_string())
}

/// Load a screenshot and OCR it. OCR failures come back as text.
pub fn ocr_image(session: &Session, source: &ImageSource) -> Result<String, String> {
    let image = load_image(source)?;
    Ok(session.extract_text(&image))
}

/// Copy text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(text).map_err(|e| e.to_string())?;
    log::info!("[ACTION] Copied {} chars to clipboard", text.chars().count());
    Ok(())
}

/// Text of one style, or an error naming what the reply lacks.
pub fn style_text(reply: &StructuredReply, style: ReplyStyle) -> Result<String, String> {
    reply
        .text_for(style)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| format!("回复中没有「{}」", style.label()))
}

/// Copy one style of a reply to the clipboard.
pub fn copy_style(reply: &StructuredReply, style: ReplyStyle) -> Result<(), String> {
    copy_to_clipboard(&style_text(reply, style)?)
}

/// Export the session log as CSV. `None` writes `shanbay_replies.csv`
/// in the working directory. Returns the path written.
pub fn export_log(session: &Session, path: Option<&Path>) -> Result<PathBuf, String> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    session.export_csv(&path).map_err(|e| e.to_string())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Endpoint, ReplyMode};
    use crate::ocr::OcrConfig;
    use serde_json::json;

    fn fast_sop_reply() -> StructuredReply {
        let value = json!({
            "insight": "用户觉得钱白花了",
            "options": {"style_soft": "宝宝对不起", "style_pro": "", "style_humor": "卡成PPT了"},
            "reply_dm": "私信我们补偿"
        });
        StructuredReply::from_value(ReplyMode::FastSop, value, "").unwrap()
    }

    #[test]
    fn style_text_reads_present_style() {
        assert_eq!(
            style_text(&fast_sop_reply(), ReplyStyle::Soft).unwrap(),
            "宝宝对不起"
        );
    }

    #[test]
    fn style_text_rejects_missing_or_blank() {
        let reply = fast_sop_reply();
        assert!(style_text(&reply, ReplyStyle::Pro).is_err());
        let err = style_text(&reply, ReplyStyle::Final).unwrap_err();
        assert!(err.contains("建议回复示范"));
    }

    #[test]
    fn export_of_empty_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let session = Session::new(Endpoint::default(), &OcrConfig::default());
        let err = export_log(&session, Some(&path)).unwrap_err();
        assert_eq!(err, "暂无记录");
        assert!(!path.exists());
    }

    #[test]
    fn missing_image_file_is_an_error() {
        let source = ImageSource::File(PathBuf::from("/no/such/shot.png"));
        assert!(load_image(&source).is_err());
    }
}
