//! Control word parsing for the chat application.
//!
//! A handful of bare words control the session instead of being sent to the
//! model. They are matched case-insensitively after trimming; anything else
//! is a message.

/// What a line of user input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Exit the chat application (`exit`, `quit`, `bye`).
    Quit,

    /// Start a new conversation (`clear`).
    Clear,

    /// Nothing but whitespace; ignored.
    Empty,

    /// Text to forward to the model, trimmed.
    Message(String),
}

/// Parses one line of user input.
///
/// # Examples
///
/// ```
/// # use gemchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command(" EXIT "), ChatCommand::Quit);
/// assert_eq!(parse_command("clear"), ChatCommand::Clear);
/// assert_eq!(parse_command("Hi"), ChatCommand::Message("Hi".to_string()));
/// ```
pub fn parse_command(input: &str) -> ChatCommand {
    let input = input.trim();
    if input.is_empty() {
        return ChatCommand::Empty;
    }

    match input.to_lowercase().as_str() {
        "exit" | "quit" | "bye" => ChatCommand::Quit,
        "clear" => ChatCommand::Clear,
        _ => ChatCommand::Message(input.to_string()),
    }
}

/// Returns the banner shown when the chat starts.
pub fn welcome_text() -> &'static str {
    r#"Welcome to Gemini AI Chatbot!
Type 'exit', 'quit', or 'bye' to end the conversation.
Type 'clear' to start a new conversation."#
}
