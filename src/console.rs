//! Interactive console — the operator's desk.
//!
//! A menu loop over one `Session`: bring in a screenshot, edit the comment,
//! set context, switch mode, generate, copy a style, export the log.
//! The session log lives exactly as long as this loop.

use crate::commands::{self, ImageSource};
use crate::llm::provider::mask_key;
use crate::llm::{ReplyMode, ReplyStyle, StructuredReply};
use crate::ocr::OCR_ERROR_PREFIX;
use crate::pipeline::{self, ReplyJob};
use crate::session::{Session, DEFAULT_EXPORT_FILE};
use crate::settings::ResolvedKey;
use dialoguer::{Error as DialoguerError, Input, Select};
use std::io::ErrorKind;
use std::path::PathBuf;

pub const FEEDBACK_URL: &str =
    "https://web.shanbay.com/words/app/feedback?shanbay_immersive_mode=true#/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    PasteScreenshot,
    LoadImage,
    EditComment,
    SetContext,
    SwitchMode,
    Generate,
    CopyStyle,
    ExportCsv,
    Feedback,
    Quit,
}

const MENU: [MenuAction; 10] = [
    MenuAction::PasteScreenshot,
    MenuAction::LoadImage,
    MenuAction::EditComment,
    MenuAction::SetContext,
    MenuAction::SwitchMode,
    MenuAction::Generate,
    MenuAction::CopyStyle,
    MenuAction::ExportCsv,
    MenuAction::Feedback,
    MenuAction::Quit,
];

impl MenuAction {
    fn label(&self) -> &'static str {
        match self {
            MenuAction::PasteScreenshot => "📋 粘贴截图并识别",
            MenuAction::LoadImage => "🖼️ 打开图片文件并识别",
            MenuAction::EditComment => "✏️ 编辑用户评论",
            MenuAction::SetContext => "🔧 内部事实/限制 (Context)",
            MenuAction::SwitchMode => "🎛️ 切换模式",
            MenuAction::Generate => "✨ 生成回复",
            MenuAction::CopyStyle => "📎 复制话术",
            MenuAction::ExportCsv => "💾 导出记录 (CSV)",
            MenuAction::Feedback => "🔗 官方反馈后台",
            MenuAction::Quit => "退出",
        }
    }
}

/// What the operator has on the desk between actions.
#[derive(Debug, Default)]
struct Desk {
    comment: String,
    context: Option<String>,
    mode: ReplyMode,
    last_reply: Option<StructuredReply>,
}

impl Desk {
    fn job(&self) -> ReplyJob {
        ReplyJob {
            text: Some(self.comment.clone()),
            image: None,
            context: self.context.clone(),
            mode: self.mode,
        }
    }

    /// Take OCR output as the new comment, unless it is an error report.
    fn accept_ocr(&mut self, text: String) -> Result<(), String> {
        if text.starts_with(OCR_ERROR_PREFIX) {
            return Err(text);
        }
        self.comment = text;
        Ok(())
    }

    fn status_line(&self, key: Option<&ResolvedKey>, logged: usize) -> String {
        let key = key
            .map(|k| format!("{} ({})", mask_key(&k.key), k.source.label()))
            .unwrap_or_else(|| "未配置".to_string());
        let comment = if self.comment.is_empty() {
            "(空)".to_string()
        } else {
            self.comment.chars().take(30).collect()
        };
        format!(
            "模式: {} | Key: {} | 已记录: {} 条\n评论: {}",
            self.mode, key, logged, comment
        )
    }
}

/// Run the menu loop until the operator quits or input closes.
pub async fn run_console(session: &mut Session, api_key: Option<ResolvedKey>) -> Result<(), String> {
    let mut desk = Desk::default();
    let items: Vec<&str> = MENU.iter().map(MenuAction::label).collect();

    loop {
        println!("\n{}", desk.status_line(api_key.as_ref(), session.log().len()));
        let selection = Select::new()
            .with_prompt("请选择操作")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(|err| format!("Failed to read menu selection: {}", err))?;
        let Some(index) = selection else {
            break;
        };

        match MENU[index] {
            MenuAction::PasteScreenshot => ocr_into_desk(session, &mut desk, ImageSource::Clipboard),
            MenuAction::LoadImage => {
                if let Some(path) = prompt_text("图片路径", "")? {
                    ocr_into_desk(session, &mut desk, ImageSource::File(PathBuf::from(path)));
                }
            }
            MenuAction::EditComment => {
                if let Some(text) = prompt_text("用户评论内容", &desk.comment)? {
                    desk.comment = text;
                }
            }
            MenuAction::SetContext => {
                let current = desk.context.clone().unwrap_or_default();
                if let Some(text) = prompt_text("内部事实/限制 (留空为常规安抚)", &current)? {
                    desk.context = Some(text).filter(|t| !t.trim().is_empty());
                }
            }
            MenuAction::SwitchMode => {
                desk.mode = desk.mode.toggled();
                println!("已切换到 {}", desk.mode);
            }
            MenuAction::Generate => {
                let key = api_key.as_ref().map(|k| k.key.as_str()).unwrap_or_default();
                println!("正在揣摩用户心理并撰写文案...");
                match pipeline::process_reply(session, &desk.job(), key).await {
                    Ok(reply) => {
                        println!("\n{}", pipeline::render_reply(&reply));
                        desk.last_reply = Some(reply);
                    }
                    Err(e) => eprintln!("{}", pipeline::render_error(&e)),
                }
            }
            MenuAction::CopyStyle => copy_from_last(&desk)?,
            MenuAction::ExportCsv => {
                if let Some(path) = prompt_text("导出路径", DEFAULT_EXPORT_FILE)? {
                    match commands::export_log(session, Some(PathBuf::from(path).as_path())) {
                        Ok(path) => println!("✅ 已导出 {}", path.display()),
                        Err(e) => eprintln!("{}", e),
                    }
                }
            }
            MenuAction::Feedback => println!("🔗 {}", FEEDBACK_URL),
            MenuAction::Quit => break,
        }
    }

    log::info!("[SESSION] Closed with {} entries", session.log().len());
    Ok(())
}

fn ocr_into_desk(session: &Session, desk: &mut Desk, source: ImageSource) {
    println!("OCR 识别中...");
    match commands::ocr_image(session, &source).and_then(|text| desk.accept_ocr(text)) {
        Ok(()) if desk.comment.is_empty() => println!("未识别到文字"),
        Ok(()) => println!("识别结果: {}", desk.comment),
        Err(e) => eprintln!("{}", e),
    }
}

fn copy_from_last(desk: &Desk) -> Result<(), String> {
    let Some(reply) = &desk.last_reply else {
        eprintln!("还没有生成回复");
        return Ok(());
    };
    let styles = ReplyStyle::for_mode(reply.mode());
    let items: Vec<&str> = styles.iter().map(ReplyStyle::label).collect();
    let selection = Select::new()
        .with_prompt("复制哪一条")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|err| format!("Failed to select style: {}", err))?;
    if let Some(index) = selection {
        match commands::copy_style(reply, styles[index]) {
            Ok(()) => println!("✅ 已复制 {}", styles[index].label()),
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

/// Line input with an initial value. `None` when the operator interrupts.
fn prompt_text(prompt: &str, initial: &str) -> Result<Option<String>, String> {
    match Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
    {
        Ok(value) => Ok(Some(value)),
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(format!("Failed to read {}: {}", prompt, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::KeySource;

    #[test]
    fn menu_labels_are_unique() {
        let mut labels: Vec<&str> = MENU.iter().map(MenuAction::label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), MENU.len());
    }

    #[test]
    fn ocr_error_does_not_replace_comment() {
        let mut desk = Desk {
            comment: "原评论".to_string(),
            ..Default::default()
        };
        let err = desk
            .accept_ocr(format!("{}engine missing", OCR_ERROR_PREFIX))
            .unwrap_err();
        assert!(err.starts_with(OCR_ERROR_PREFIX));
        assert_eq!(desk.comment, "原评论");

        desk.accept_ocr("会员白充了".to_string()).unwrap();
        assert_eq!(desk.comment, "会员白充了");
    }

    #[test]
    fn job_carries_desk_state() {
        let desk = Desk {
            comment: "太卡了".to_string(),
            context: Some("已在修复".to_string()),
            mode: ReplyMode::DeepBreakdown,
            last_reply: None,
        };
        let job = desk.job();
        assert_eq!(job.text.as_deref(), Some("太卡了"));
        assert_eq!(job.context.as_deref(), Some("已在修复"));
        assert_eq!(job.mode, ReplyMode::DeepBreakdown);
    }

    #[test]
    fn status_line_masks_key() {
        let desk = Desk::default();
        let key = ResolvedKey {
            key: "sk-1234567890abcd".to_string(),
            source: KeySource::Environment,
        };
        let line = desk.status_line(Some(&key), 2);
        assert!(line.contains("...abcd"));
        assert!(!line.contains("sk-1234567890"));
        assert!(line.contains("已记录: 2 条"));
    }
}
