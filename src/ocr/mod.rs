//! OCR domain — screenshot pixels to comment text.
//!
//! Wraps the tesseract engine for use in the reply pipeline.
//! External code should only use the public items here.
//!
//! Failures never propagate: `Recognizer::extract_text` turns them into a
//! readable "识别出错: ..." string the operator can see and edit.

mod tesseract;

use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_LANGUAGE: &str = "chi_sim+eng";

/// Prefix of the string returned in place of recognized text on failure.
pub const OCR_ERROR_PREFIX: &str = "识别出错: ";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("未找到 tesseract 可执行文件: {0}")]
    EngineNotFound(String),
    #[error("图片编码失败: {0}")]
    Encode(String),
    #[error("tesseract 运行失败: {0}")]
    Engine(String),
}

/// Engine location and language selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Explicit engine path; `None` searches `PATH`.
    pub binary: Option<PathBuf>,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Session-scoped OCR handle. The engine is located once, at creation.
#[derive(Debug)]
pub struct Recognizer {
    engine: Result<PathBuf, String>,
    language: String,
}

impl Recognizer {
    pub fn new(config: &OcrConfig) -> Self {
        let engine = tesseract::locate(config.binary.as_deref()).map_err(|e| e.to_string());
        match &engine {
            Ok(path) => log::info!("[OCR] Engine: {}", path.display()),
            Err(e) => log::warn!("[OCR] {}", e),
        }
        Self {
            engine,
            language: config.language.clone(),
        }
    }

    /// Recognized lines, top to bottom.
    pub fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        let engine = self
            .engine
            .as_ref()
            .map_err(|e| OcrError::EngineNotFound(e.clone()))?;
        let png_bytes = crate::capture::encode_png(image).map_err(|e| OcrError::Encode(e.to_string()))?;

        let start = std::time::Instant::now();
        let lines = tesseract::run(engine, &self.language, &png_bytes)?;
        log::info!(
            "[OCR] Extracted {} lines in {}ms",
            lines.len(),
            start.elapsed().as_millis()
        );
        Ok(lines)
    }

    /// Recognized text joined with single spaces, "" when nothing was found,
    /// or "识别出错: ..." on failure.
    pub fn extract_text(&self, image: &DynamicImage) -> String {
        match self.recognize_lines(image) {
            Ok(lines) => join_lines(&lines),
            Err(e) => {
                log::error!("[OCR] {}", e);
                format!("{}{}", OCR_ERROR_PREFIX, e)
            }
        }
    }
}

/// Join non-blank line texts with single spaces.
pub fn join_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
