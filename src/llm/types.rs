//! Reply request and response types.
//!
//! `StructuredReply` keeps the decoded JSON object as-is; the typed views
//! (`FastSopReply`, `DeepBreakdownReply`) are lenient readers over it so a
//! reply with a missing or mistyped field still renders what it has.

use crate::error::ReplyError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::decode::DecodeError;
use super::prompts::DEFAULT_CONTEXT;

/// Which persona template and reply shape to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyMode {
    /// Insight + three reply styles + DM guidance.
    #[default]
    FastSop,
    /// Emotion diagnosis + step plan + polished reply.
    DeepBreakdown,
}

impl ReplyMode {
    /// Label shown in the console and written to the session log.
    pub fn label(&self) -> &'static str {
        match self {
            ReplyMode::FastSop => "三维话术",
            ReplyMode::DeepBreakdown => "深度拆解",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ReplyMode::FastSop => ReplyMode::DeepBreakdown,
            ReplyMode::DeepBreakdown => ReplyMode::FastSop,
        }
    }
}

impl fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One generation request. Built per operator action and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    user_text: String,
    context_info: Option<String>,
    mode: ReplyMode,
}

impl ReplyRequest {
    /// Fails with [`ReplyError::EmptyComment`] when the comment is blank.
    pub fn new(
        user_text: impl Into<String>,
        context_info: Option<&str>,
        mode: ReplyMode,
    ) -> Result<Self, ReplyError> {
        let user_text = user_text.into();
        if user_text.trim().is_empty() {
            return Err(ReplyError::EmptyComment);
        }
        Ok(Self {
            user_text,
            context_info: context_info.map(str::to_string),
            mode,
        })
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn mode(&self) -> ReplyMode {
        self.mode
    }

    /// The context string, or "常规安抚" when absent or blank.
    pub fn context_or_default(&self) -> &str {
        match self.context_info.as_deref() {
            Some(ctx) if !ctx.trim().is_empty() => ctx,
            _ => DEFAULT_CONTEXT,
        }
    }

    /// First 20 characters of the comment, for the session log.
    pub fn preview(&self) -> String {
        self.user_text.chars().take(20).collect()
    }
}

/// Copy targets the operator can pick from a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStyle {
    Soft,
    Pro,
    Humor,
    Dm,
    Final,
}

impl ReplyStyle {
    pub fn label(&self) -> &'static str {
        match self {
            ReplyStyle::Soft => "方案A：软萌示弱",
            ReplyStyle::Pro => "方案B：专业诚恳",
            ReplyStyle::Humor => "方案C：幽默自黑",
            ReplyStyle::Dm => "私信引导话术",
            ReplyStyle::Final => "建议回复示范",
        }
    }

    /// Styles a reply of the given mode can offer.
    pub fn for_mode(mode: ReplyMode) -> &'static [ReplyStyle] {
        match mode {
            ReplyMode::FastSop => &[
                ReplyStyle::Soft,
                ReplyStyle::Pro,
                ReplyStyle::Humor,
                ReplyStyle::Dm,
            ],
            ReplyMode::DeepBreakdown => &[ReplyStyle::Final],
        }
    }
}

// Field readers for the views below. Each field is read on its own: a
// mistyped field becomes empty and never takes its siblings down with it.

/// Strings as-is, numbers and booleans in their JSON spelling, anything
/// else as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(&Value::deserialize(d)?))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_text(d)?.unwrap_or_default())
}

fn lenient_options<'de, D: Deserializer<'de>>(d: D) -> Result<ReplyOptions, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => ReplyOptions::default(),
    })
}

/// Every object in the array becomes a step; other elements are skipped.
fn lenient_steps<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<StrategyStep>, D::Error> {
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyOptions {
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_soft: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_pro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_humor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastSopReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub insight: Option<String>,
    #[serde(default, deserialize_with = "lenient_options")]
    pub options: ReplyOptions,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reply_dm: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStep {
    #[serde(default, deserialize_with = "lenient_string")]
    pub step: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepBreakdownReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub emotion_diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient_steps")]
    pub strategy_steps: Vec<StrategyStep>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub final_reply: Option<String>,
}

/// A decoded model reply. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredReply {
    mode: ReplyMode,
    fields: Map<String, Value>,
}

impl StructuredReply {
    /// Wrap a decoded value. Anything other than a JSON object is a decode
    /// failure carrying the raw model output.
    pub fn from_value(mode: ReplyMode, value: Value, raw: &str) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Self { mode, fields }),
            other => {
                log::warn!("[LLM] Decoded a non-object reply: {}", other);
                Err(DecodeError::new(raw))
            }
        }
    }

    pub fn mode(&self) -> ReplyMode {
        self.mode
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn as_fast_sop(&self) -> FastSopReply {
        self.view()
    }

    pub fn as_deep_breakdown(&self) -> DeepBreakdownReply {
        self.view()
    }

    fn view<T: serde::de::DeserializeOwned + Default>(&self) -> T {
        serde_json::from_value(Value::Object(self.fields.clone())).unwrap_or_else(|e| {
            log::warn!("[LLM] Reply does not match the {} shape: {}", self.mode, e);
            T::default()
        })
    }

    /// `insight` for FastSop, `emotion_diagnosis` for DeepBreakdown.
    pub fn insight_or_diagnosis(&self) -> String {
        let key = match self.mode {
            ReplyMode::FastSop => "insight",
            ReplyMode::DeepBreakdown => "emotion_diagnosis",
        };
        self.fields
            .get(key)
            .and_then(scalar_text)
            .unwrap_or_default()
    }

    /// Text of one copy target, if the reply has it.
    pub fn text_for(&self, style: ReplyStyle) -> Option<String> {
        match style {
            ReplyStyle::Soft => self.as_fast_sop().options.style_soft,
            ReplyStyle::Pro => self.as_fast_sop().options.style_pro,
            ReplyStyle::Humor => self.as_fast_sop().options.style_humor,
            ReplyStyle::Dm => self.as_fast_sop().reply_dm,
            ReplyStyle::Final => self.as_deep_breakdown().final_reply,
        }
    }
}
