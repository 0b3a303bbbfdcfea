//! Persona prompts and the placeholder composer.
//!
//! The templates are the contract between the cabin and the model: the
//! JSON shapes they describe are exactly what `llm::types` reads back.
//! Do not rename output keys without updating the typed views.

use super::types::{ReplyMode, ReplyRequest};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const MODEL: &str = "deepseek-chat";

/// Fixed sampling temperature. Not exposed to the operator.
pub const TEMPERATURE: f64 = 0.8;

/// Used when the operator leaves the internal-context field blank.
pub const DEFAULT_CONTEXT: &str = "常规安抚";

/// FastSop template — insight, three reply styles, DM guidance.
pub const FAST_SOP_TEMPLATE: &str = r#"
你现在是【扇贝单词】的首席用户体验官（也是小红书文案大神）。
运营人员手动输入了一条用户的负面/咨询评论，请提供极致的回复策略。

【输入信息】
1. 用户评论：{user_text}
2. 内部事实(Context)：{context_info} (必须基于此事实进行解释或补偿，严禁胡编乱造)

【任务目标】
分析用户心理，并提供 3 种不同风格的回复，供运营根据当时语境选择。

【输出 JSON 结构】
{
    "insight": "一句话分析用户潜台词（例如：他其实不是想要退款，只是想要个解释/他现在极度愤怒，需要发泄窗口）",
    "options": {
        "style_soft": "方案A：软萌示弱型（适用于小Bug/日常吐槽。特点：叫宝宝，颜文字，替技术背锅，以此平息怒火）",
        "style_pro": "方案B：专业诚恳型（适用于功能失效/严肃建议。特点：不卑不亢，逻辑清晰，给出明确解决路径）",
        "style_humor": "方案C：幽默/自黑型（适用于非原则性槽点。特点：玩梗，把事故变故事，甚至能圈粉）"
    },
    "reply_dm": "私信引导话术（通用，目的是要ID或拉群，语气要急用户之所急）"
}
"#;

/// DeepBreakdown template — emotion diagnosis, step plan, polished reply.
pub const DEEP_BREAKDOWN_TEMPLATE: &str = r#"
你现在是【扇贝单词】的运营导师。请基于“软性护短 + 诚恳示弱”的人设，帮运营拆解这条让人头疼的用户吐槽。

【输入信息】
1. 用户评论：{user_text}
2. 内部事实(Context)：{context_info} (解释与补偿只能基于此事实，严禁编造“底层架构”等虚假大词)

【任务 1：话术结构拆解】
- 情绪承接：必须叫宝宝，先认错
- 软性解释：用“替客服辩解一下/排期问题”的逻辑说明原因
- 诚恳收尾：再次道歉，给出下一步

【任务 2：文案示范】
写出符合上述结构的完整回复：“好的，宝宝...替客服辩解一下...非常抱歉...”

【输出 JSON 结构】
{
    "emotion_diagnosis": "一句话诊断用户当前情绪与真实诉求",
    "strategy_steps": [
        {"step": "1. 唤称与承接", "action": "这一步具体怎么说"},
        {"step": "2. 软性解释", "action": "这一步具体怎么说"},
        {"step": "3. 诚恳收尾", "action": "这一步具体怎么说"}
    ],
    "final_reply": "最终建议的回复文案"
}
"#;

/// Misuse detected by [`compose_checked`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("占位符 {{{0}}} 不在模板中")]
    UnusedSubstitution(String),
    #[error("模板中的占位符 {{{0}}} 没有对应的值")]
    UnresolvedPlaceholder(String),
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

fn lookup<'a>(substitutions: &'a [(&str, &str)], name: &str) -> Option<&'a str> {
    substitutions
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
}

/// Replace `{name}` tokens in one pass.
///
/// Substituted values are never re-scanned, unknown tokens stay as they
/// are, and substitutions without a token are ignored.
pub fn compose(template: &str, substitutions: &[(&str, &str)]) -> String {
    placeholder()
        .replace_all(template, |caps: &regex::Captures| {
            match lookup(substitutions, &caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// [`compose`], but every substitution must be used and every token filled.
pub fn compose_checked(
    template: &str,
    substitutions: &[(&str, &str)],
) -> Result<String, PromptError> {
    let tokens: Vec<&str> = placeholder()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    for (key, _) in substitutions {
        if !tokens.contains(key) {
            return Err(PromptError::UnusedSubstitution(key.to_string()));
        }
    }
    if let Some(missing) = tokens.iter().find(|t| lookup(substitutions, t).is_none()) {
        return Err(PromptError::UnresolvedPlaceholder(missing.to_string()));
    }

    Ok(compose(template, substitutions))
}

pub fn template_for(mode: ReplyMode) -> &'static str {
    match mode {
        ReplyMode::FastSop => FAST_SOP_TEMPLATE,
        ReplyMode::DeepBreakdown => DEEP_BREAKDOWN_TEMPLATE,
    }
}

/// System prompt for one request: the mode's template with the comment
/// and context filled in.
pub fn build_system_prompt(request: &ReplyRequest) -> Result<String, PromptError> {
    compose_checked(
        template_for(request.mode()),
        &[
            ("user_text", request.user_text()),
            ("context_info", request.context_or_default()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_replaces_known_tokens() {
        let out = compose("评论：{user_text}，事实：{context_info}", &[
            ("user_text", "会员白充了"),
            ("context_info", "送7天会员"),
        ]);
        assert_eq!(out, "评论：会员白充了，事实：送7天会员");
    }

    #[test]
    fn compose_does_not_expand_substituted_values() {
        let out = compose("{user_text} / {context_info}", &[
            ("user_text", "I typed {context_info} literally"),
            ("context_info", "ctx"),
        ]);
        assert_eq!(out, "I typed {context_info} literally / ctx");
    }

    #[test]
    fn compose_leaves_unknown_tokens_and_ignores_unused_keys() {
        let out = compose("hello {name} {other}", &[("name", "ops"), ("absent", "x")]);
        assert_eq!(out, "hello ops {other}");
    }

    #[test]
    fn compose_ignores_json_braces() {
        let out = compose(r#"{"insight": "{user_text}"}"#, &[("user_text", "x")]);
        assert_eq!(out, r#"{"insight": "x"}"#);
    }

    #[test]
    fn checked_rejects_unused_substitution() {
        let err = compose_checked("{user_text}", &[("user_text", "a"), ("tone", "b")]).unwrap_err();
        assert_eq!(err, PromptError::UnusedSubstitution("tone".to_string()));
    }

    #[test]
    fn checked_rejects_unresolved_placeholder() {
        let err = compose_checked("{user_text} {context_info}", &[("user_text", "a")]).unwrap_err();
        assert_eq!(err, PromptError::UnresolvedPlaceholder("context_info".to_string()));
    }

    #[test]
    fn both_templates_take_exactly_comment_and_context() {
        for mode in [ReplyMode::FastSop, ReplyMode::DeepBreakdown] {
            let out = compose_checked(
                template_for(mode),
                &[("user_text", "U"), ("context_info", "C")],
            );
            assert!(out.is_ok(), "{:?}: {:?}", mode, out);
        }
    }

    #[test]
    fn system_prompt_uses_fallback_context() {
        let request = ReplyRequest::new("会员白充了", None, ReplyMode::FastSop).unwrap();
        let prompt = build_system_prompt(&request).unwrap();
        assert!(prompt.contains("用户评论：会员白充了"));
        assert!(prompt.contains("内部事实(Context)：常规安抚"));
        assert!(prompt.contains("\"style_humor\""));
    }

    #[test]
    fn deep_prompt_describes_strategy_steps() {
        let request =
            ReplyRequest::new("卡死了", Some("技术已在修复"), ReplyMode::DeepBreakdown).unwrap();
        let prompt = build_system_prompt(&request).unwrap();
        assert!(prompt.contains("技术已在修复"));
        assert!(prompt.contains("\"strategy_steps\""));
        assert!(prompt.contains("\"final_reply\""));
    }
}
