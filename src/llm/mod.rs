//! LLM domain — persona prompts, the chat call, and resilient decoding.
//!
//! Public API for the reply layer of the cabin.
//! External code should only use the items exported here.
//!
//!   - prompts.rs  — templates, constants, placeholder composer
//!   - decode.rs   — fence/prose-tolerant JSON decoding
//!   - chat.rs     — single non-streamed chat completion
//!   - generate.rs — per-mode orchestration
//!   - provider.rs — endpoint metadata and resolution

pub mod chat;
pub mod decode;
mod generate;
pub mod prompts;
pub mod provider;
pub mod types;

pub use chat::ChatClient;
pub use decode::{decode, decode_or_sentinel, DecodeError};
pub use generate::generate_reply;
pub use prompts::{compose, compose_checked, PromptError};
pub use provider::Endpoint;
pub use types::{ReplyMode, ReplyRequest, ReplyStyle, StructuredReply};
