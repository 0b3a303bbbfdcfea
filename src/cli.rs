//! Command-line surface.

use crate::llm::{ReplyMode, ReplyStyle};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reply-cabin")]
#[command(version)]
#[command(
    about = "Draft support replies from complaint screenshots",
    long_about = None
)]
pub struct Cli {
    /// Chat endpoint base URL (overrides DEEPSEEK_BASE_URL and settings)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Model name (overrides DEEPSEEK_MODEL and settings)
    #[arg(long, global = true)]
    pub model: Option<String>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive console (default)
    #[clap(visible_alias = "s")]
    Session,
    /// Generate one reply and print it
    #[clap(visible_alias = "r")]
    Reply {
        /// Comment text; omit to OCR --image or --paste instead
        text: Option<String>,
        /// Internal facts or constraints the reply must respect
        #[arg(short, long)]
        context: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ModeArg::FastSop)]
        mode: ModeArg,
        /// Screenshot file to OCR
        #[arg(long, conflicts_with = "paste")]
        image: Option<PathBuf>,
        /// OCR the image on the clipboard
        #[arg(long)]
        paste: bool,
        /// Copy this style to the clipboard afterwards
        #[arg(long, value_enum)]
        copy: Option<StyleArg>,
        /// Export the session log to this CSV file afterwards
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the decoded JSON object instead of the rendered reply
        #[arg(long)]
        json: bool,
    },
    /// OCR a screenshot and print the text
    Ocr {
        image: Option<PathBuf>,
        #[arg(long, conflicts_with = "image")]
        paste: bool,
    },
    /// Manage the API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Save a key to the OS keychain (prompts when omitted)
    Save { key: Option<String> },
    /// Show where the key comes from, masked
    Show,
    /// Send a minimal request with the resolved key
    Test,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    Show,
    /// Set one of: base_url, model, tesseract_path, ocr_language (empty clears)
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    FastSop,
    DeepBreakdown,
}

impl From<ModeArg> for ReplyMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::FastSop => ReplyMode::FastSop,
            ModeArg::DeepBreakdown => ReplyMode::DeepBreakdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    Soft,
    Pro,
    Humor,
    Dm,
    Final,
}

impl From<StyleArg> for ReplyStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Soft => ReplyStyle::Soft,
            StyleArg::Pro => ReplyStyle::Pro,
            StyleArg::Humor => ReplyStyle::Humor,
            StyleArg::Dm => ReplyStyle::Dm,
            StyleArg::Final => ReplyStyle::Final,
        }
    }
}
