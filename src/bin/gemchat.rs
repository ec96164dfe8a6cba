//! Interactive chat with a Gemini model.
//!
//! # Usage
//!
//! ```bash
//! # Uses GEMINI_API_KEY, or prompts for a key
//! gemchat
//!
//! # Pick another model
//! GEMINI_MODEL=gemini-1.5-pro gemchat
//!
//! # Plain output, debug logging on stderr
//! NO_COLOR=1 GEMCHAT_LOG=gemchat=debug gemchat
//! ```
//!
//! While chatting, type `clear` to start over and `exit`, `quit`, or `bye`
//! to leave.

use std::io;
use std::process::ExitCode;

use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use gemchat::chat::{self, ChatConfig, ChatSession, Interrupt, PlainTextRenderer, Renderer};
use gemchat::credential::{API_KEY_URL, CredentialResolver};
use gemchat::{Error, Gemini, Result};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "GEMCHAT_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();
    let (mut session, mut editor) = match setup().await {
        Ok(ready) => ready,
        Err(err) => {
            report_fatal(&err);
            return ExitCode::FAILURE;
        }
    };
    match chat_main(&mut session, &mut editor).await {
        Ok(exit) => {
            tracing::debug!(?exit, "chat ended");
            ExitCode::SUCCESS
        }
        Err(err) if err.is_fatal() => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("gemchat=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Everything up to a verified connection. Any failure here is fatal.
async fn setup() -> Result<(ChatSession<Gemini>, DefaultEditor)> {
    let config = ChatConfig::from_env();
    let mut editor = DefaultEditor::new()?;

    let credential = CredentialResolver::new()
        .with_settings_path(config.settings_path.clone())
        .resolve(&mut editor, &mut io::stdout())?;

    let session = ChatSession::connect(&credential, config).await?;
    Ok((session, editor))
}

async fn chat_main(
    session: &mut ChatSession<Gemini>,
    editor: &mut DefaultEditor,
) -> Result<chat::LoopExit> {
    let mut renderer = PlainTextRenderer::with_color(session.config().use_color);
    renderer.print_info(&format!(
        "Successfully connected to {} model.",
        session.model()
    ));

    let interrupt = Interrupt::new();
    interrupt.install()?;

    renderer.print_banner(chat::welcome_text());
    chat::run(session, editor, &mut renderer, &interrupt).await
}

fn report_fatal(err: &Error) {
    if err.is_authentication() {
        eprintln!("Error: API key is invalid. Please check your API key and try again.");
        eprintln!("Details: {err}");
    } else {
        eprintln!("Error: {err}");
    }
    eprintln!("Please get a valid API key from: {API_KEY_URL}");
}
