//! Core screenshot-to-reply pipeline.
//!
//! The multi-step flow behind `reply` and the console's generate action:
//! capture → OCR → request → generate → render.

use crate::commands::{self, ImageSource};
use crate::error::ReplyError;
use crate::llm::{ReplyMode, ReplyRequest, ReplyStyle, StructuredReply};
use crate::ocr::OCR_ERROR_PREFIX;
use crate::session::Session;
use serde_json::{json, Value};
use thiserror::Error;

/// Usage captions shown under each FastSop style.
const STYLE_CAPTIONS: [(ReplyStyle, &str); 3] = [
    (ReplyStyle::Soft, "适用：想要被哄的用户 / 明显是我们错了的场景"),
    (ReplyStyle::Pro, "适用：较理性的用户 / 涉及功能原理的解释"),
    (ReplyStyle::Humor, "适用：纯吐槽 / 想要把差评变成神评论"),
];

/// One reply action: either typed text, a screenshot, or both (text wins).
#[derive(Debug, Clone)]
pub struct ReplyJob {
    pub text: Option<String>,
    pub image: Option<ImageSource>,
    pub context: Option<String>,
    pub mode: ReplyMode,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Capture(String),
    #[error("{0}")]
    Ocr(String),
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

impl PipelineError {
    pub fn to_error_object(&self) -> Value {
        match self {
            PipelineError::Reply(e) => e.to_error_object(),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// The comment text for a job: typed text if present, else OCR of the image.
pub fn comment_text(session: &Session, job: &ReplyJob) -> Result<String, PipelineError> {
    if let Some(text) = job.text.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(text.to_string());
    }
    let Some(source) = &job.image else {
        return Ok(String::new());
    };
    let text = commands::ocr_image(session, source).map_err(PipelineError::Capture)?;
    if text.starts_with(OCR_ERROR_PREFIX) {
        return Err(PipelineError::Ocr(text));
    }
    log::info!("[PIPELINE] OCR text: {} chars", text.chars().count());
    Ok(text)
}

/// Run a job end to end. The session log grows only when this succeeds.
pub async fn process_reply(
    session: &mut Session,
    job: &ReplyJob,
    api_key: &str,
) -> Result<StructuredReply, PipelineError> {
    let pipeline_start = std::time::Instant::now();
    let text = comment_text(session, job)?;
    let request = ReplyRequest::new(&text, job.context.as_deref(), job.mode)?;
    let reply = session.generate(&request, api_key).await?;
    log::info!(
        "[PIPELINE] {} reply in {}ms",
        job.mode,
        pipeline_start.elapsed().as_millis()
    );
    Ok(reply)
}

/// Human-readable rendering of a reply for the terminal.
pub fn render_reply(reply: &StructuredReply) -> String {
    match reply.mode() {
        ReplyMode::FastSop => render_fast_sop(reply),
        ReplyMode::DeepBreakdown => render_deep_breakdown(reply),
    }
}

fn render_fast_sop(reply: &StructuredReply) -> String {
    let view = reply.as_fast_sop();
    let mut out = format!("🧠 心理洞察：{}\n", view.insight.unwrap_or_default());
    for (style, caption) in STYLE_CAPTIONS {
        out.push_str(&format!(
            "\n【{}】\n{}\n  {}\n",
            style.label(),
            reply.text_for(style).unwrap_or_default(),
            caption
        ));
    }
    out.push_str(&format!(
        "\n【🤫 {} (通用)】\n{}\n",
        ReplyStyle::Dm.label(),
        view.reply_dm.unwrap_or_default()
    ));
    out
}

fn render_deep_breakdown(reply: &StructuredReply) -> String {
    let view = reply.as_deep_breakdown();
    let mut out = format!(
        "🌡️ 情绪诊断: {}\n",
        view.emotion_diagnosis.as_deref().unwrap_or("未知")
    );
    for (i, step) in view.strategy_steps.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n", i + 1, step.step, step.action));
    }
    out.push_str(&format!(
        "\n✍️ {}\n{}\n",
        ReplyStyle::Final.label(),
        view.final_reply.unwrap_or_default()
    ));
    out
}

/// Error object as pretty JSON, for display.
pub fn render_error(error: &PipelineError) -> String {
    serde_json::to_string_pretty(&error.to_error_object()).unwrap_or_else(|_| error.to_string())
}
