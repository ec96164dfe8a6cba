//! Interactive chat with a Gemini model.
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: environment-driven configuration
//! - [`session`]: conversation state and the per-turn exchange
//! - [`commands`]: control word parsing
//! - [`render`]: terminal output
//! - [`repl`]: the read-eval-print loop tying them together

mod commands;
mod config;
mod interrupt;
mod render;
mod repl;
mod session;

pub use commands::{ChatCommand, parse_command, welcome_text};
pub use config::{BASE_URL_ENV, ChatConfig, MODEL_ENV, NO_COLOR_ENV, TIMEOUT_ENV};
pub use interrupt::Interrupt;
pub use render::{FAILURE_NOTICE, PlainTextRenderer, Renderer};
pub use repl::{LoopExit, MAX_READ_FAILURES, PROMPT, run};
pub use session::{ChatSession, Conversation};
