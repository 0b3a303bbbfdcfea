//! Reply orchestration — one request in, one structured reply out.
//!
//! Both modes share this flow; they differ only in template and expected
//! reply shape:
//!   key check → compose prompt → one chat completion → resilient decode

use crate::error::ReplyError;

use super::chat::ChatClient;
use super::decode;
use super::prompts;
use super::types::{ReplyRequest, StructuredReply};

/// Generate a reply for `request`.
///
/// A blank `api_key` fails with [`ReplyError::MissingApiKey`] before any
/// network traffic. Decode failures carry the raw completion.
pub async fn generate_reply(
    client: &ChatClient,
    request: &ReplyRequest,
    api_key: &str,
) -> Result<StructuredReply, ReplyError> {
    if api_key.trim().is_empty() {
        log::warn!("[LLM] No API key — skipping request");
        return Err(ReplyError::MissingApiKey);
    }

    let system_prompt = prompts::build_system_prompt(request)?;
    log::info!(
        "[LLM] Mode: {} — comment {} chars, context: {}",
        request.mode(),
        request.user_text().chars().count(),
        request.context_or_default()
    );

    let raw = client
        .complete(api_key, &system_prompt, request.user_text())
        .await?;
    log::debug!("[LLM] Raw completion: {} chars", raw.len());

    let value = decode::decode(&raw)?;
    let reply = StructuredReply::from_value(request.mode(), value, &raw)?;
    log::info!("[LLM] Decoded {} fields", reply.fields().len());
    Ok(reply)
}
