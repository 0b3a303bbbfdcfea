//! Reply Cabin — support-reply drafting desk.
//!
//! This is the app shell that wires together all domains and commands.
//! No business logic lives here — only module declarations, startup,
//! and the command dispatch.
//!
//! Commands are split across:
//!   - commands.rs  — simple one-step commands (image load, clipboard, export)
//!   - pipeline.rs  — multi-step orchestration (capture → OCR → generate → render)
//!   - console.rs   — the interactive menu loop
//!   - settings/    — API key, endpoint and OCR configuration

pub mod capture;
pub mod cli;
pub mod commands;
pub mod console;
pub mod error;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod session;
pub mod settings;

use clap::Parser;
use cli::{Cli, Commands, KeyCommands, SettingsCommands};
use commands::ImageSource;
use pipeline::ReplyJob;
use session::Session;
use std::path::PathBuf;
use std::process::ExitCode;

pub use error::{ExportError, ReplyError};
pub use llm::{generate_reply, ChatClient, Endpoint, ReplyMode, ReplyRequest, StructuredReply};

/// Entry point — called by main.
pub async fn run() -> ExitCode {
    // Load .env.local → .env from the working directory. Existing
    // variables are never overridden.
    'env_load: for env_file in [".env.local", ".env"] {
        let path = PathBuf::from(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), String> {
    let settings = settings::load_settings();
    let endpoint = settings::resolve_endpoint(&settings, cli.base_url, cli.model);
    log::info!(
        "[STARTUP] Provider: {} ({})",
        llm::provider::provider_info().name,
        endpoint.base_url
    );

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => {
            let api_key = settings::resolve_api_key(true);
            let mut session = Session::new(endpoint, &settings::ocr_config(&settings));
            console::run_console(&mut session, api_key).await
        }
        Commands::Reply {
            text,
            context,
            mode,
            image,
            paste,
            copy,
            export,
            json,
        } => {
            let image = match (image, paste) {
                (Some(path), _) => Some(ImageSource::File(path)),
                (None, true) => Some(ImageSource::Clipboard),
                (None, false) => None,
            };
            let job = ReplyJob {
                text,
                image,
                context,
                mode: mode.into(),
            };
            let mut session = Session::new(endpoint, &settings::ocr_config(&settings));
            let api_key = settings::resolve_api_key(true)
                .map(|k| k.key)
                .unwrap_or_default();

            let reply = pipeline::process_reply(&mut session, &job, &api_key)
                .await
                .map_err(|e| pipeline::render_error(&e))?;

            if json {
                let fields = serde_json::Value::Object(reply.fields().clone());
                println!(
                    "{}",
                    serde_json::to_string_pretty(&fields).map_err(|e| e.to_string())?
                );
            } else {
                println!("{}", pipeline::render_reply(&reply));
            }
            if let Some(style) = copy {
                commands::copy_style(&reply, style.into())?;
                eprintln!("✅ Copied to clipboard");
            }
            if let Some(path) = export {
                let written = commands::export_log(&session, Some(path.as_path()))?;
                eprintln!("✅ Exported {}", written.display());
            }
            Ok(())
        }
        Commands::Ocr { image, paste } => {
            let source = match (image, paste) {
                (Some(path), _) => ImageSource::File(path),
                (None, true) => ImageSource::Clipboard,
                (None, false) => return Err("Give an image path or --paste".to_string()),
            };
            let session = Session::new(endpoint, &settings::ocr_config(&settings));
            println!("{}", commands::ocr_image(&session, &source)?);
            Ok(())
        }
        Commands::Key { command } => run_key(command, &endpoint).await,
        Commands::Settings { command } => run_settings(command, settings, &endpoint),
    }
}

async fn run_key(command: KeyCommands, endpoint: &Endpoint) -> Result<(), String> {
    match command {
        KeyCommands::Save { key } => {
            let key = match key {
                Some(key) => key,
                None => dialoguer::Password::new()
                    .with_prompt("DeepSeek API Key")
                    .interact()
                    .map_err(|e| format!("Failed to read key: {}", e))?,
            };
            settings::save_api_key(&key)?;
            println!("✅ Saved ({})", llm::provider::mask_key(key.trim()));
            Ok(())
        }
        KeyCommands::Show => {
            match settings::resolve_api_key(false) {
                Some(k) => println!("{} ({})", llm::provider::mask_key(&k.key), k.source.label()),
                None => println!("{}", ReplyError::MissingApiKey),
            }
            Ok(())
        }
        KeyCommands::Test => {
            let key = settings::resolve_api_key(true)
                .ok_or_else(|| ReplyError::MissingApiKey.to_string())?;
            if settings::test_endpoint(endpoint, &key.key).await? {
                println!("✅ {} accepted the key", endpoint.base_url);
                Ok(())
            } else {
                Err(format!("{} rejected the key", endpoint.base_url))
            }
        }
    }
}

fn run_settings(
    command: SettingsCommands,
    mut current: settings::Settings,
    endpoint: &Endpoint,
) -> Result<(), String> {
    match command {
        SettingsCommands::Show => {
            let view = serde_json::json!({
                "provider": llm::provider::provider_info(),
                "effective": endpoint,
                "file": current,
            });
            let json = serde_json::to_string_pretty(&view).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        SettingsCommands::Set { key, value } => {
            current.set(&key, &value)?;
            settings::save_settings(&current)?;
            println!("✅ {} updated", key);
        }
        SettingsCommands::Path => println!("{}", settings::store::settings_path().display()),
    }
    Ok(())
}
