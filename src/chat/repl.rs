//! The read-eval-print loop.

use std::error::Error as _;

use crate::chat::commands::{ChatCommand, parse_command};
use crate::chat::interrupt::Interrupt;
use crate::chat::render::Renderer;
use crate::chat::session::ChatSession;
use crate::error::{Error, ErrorKind, Result};
use crate::input::{Input, LineSource};
use crate::transport::Transport;

/// Prompt shown before each line of input.
pub const PROMPT: &str = "You: ";

/// Consecutive read failures after which the input is considered gone.
pub const MAX_READ_FAILURES: usize = 8;

/// Why the loop ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed `exit`, `quit`, or `bye`.
    Quit,
    /// The user pressed Ctrl-C.
    Interrupted,
    /// Input was closed.
    EndOfInput,
}

/// Runs the chat until the user leaves or a fatal error occurs.
///
/// Returns `Err` only for errors that end the program: the API stopped
/// accepting the credential, or [`MAX_READ_FAILURES`] reads in a row failed.
/// Every other failure is reported through `renderer` and the loop carries on.
pub async fn run<T: Transport>(
    session: &mut ChatSession<T>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
    interrupt: &Interrupt,
) -> Result<LoopExit> {
    let mut read_failures = 0;
    loop {
        let read = input.read_line(PROMPT);
        if interrupt.is_triggered() {
            return Ok(interrupted(renderer));
        }
        let line = match read {
            Ok(Input::Line(line)) => {
                read_failures = 0;
                line
            }
            Ok(Input::Interrupted) => return Ok(interrupted(renderer)),
            Ok(Input::EndOfInput) => {
                renderer.print_info("\nGoodbye!");
                return Ok(LoopExit::EndOfInput);
            }
            Err(err) => {
                read_failures += 1;
                tracing::warn!(read_failures, "reading input failed: {err}");
                if read_failures >= MAX_READ_FAILURES {
                    return Err(err);
                }
                renderer.print_error(&format!("An error occurred: {err}"));
                renderer.print_info("Let's continue our conversation.");
                continue;
            }
        };

        match parse_command(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => {
                renderer.print_info("\nThank you for chatting! Goodbye.");
                return Ok(LoopExit::Quit);
            }
            ChatCommand::Clear => {
                session.reset();
                renderer.print_info("\nConversation has been reset.\n");
            }
            ChatCommand::Message(text) => {
                input.add_history(&text);
                renderer.start_waiting();
                let outcome = tokio::select! {
                    result = session.send(&text) => Some(result),
                    _ = interrupt.notified() => None,
                };
                renderer.finish_waiting();
                match outcome {
                    None => return Ok(interrupted(renderer)),
                    Some(Ok(reply)) => renderer.print_reply(&reply),
                    Some(Err(err)) if err.is_fatal() => return Err(err),
                    Some(Err(err)) => {
                        report_turn_error(renderer, &err);
                        renderer.print_failure_notice();
                    }
                }
            }
        }
    }
}

fn interrupted(renderer: &mut dyn Renderer) -> LoopExit {
    renderer.print_info("\n\nInterrupted by user. Exiting...");
    LoopExit::Interrupted
}

fn report_turn_error(renderer: &mut dyn Renderer, err: &Error) {
    match err.kind() {
        ErrorKind::PermissionDenied => renderer
            .print_error("Permission denied. Your API key may not have access to this model."),
        ErrorKind::QuotaExhausted => renderer
            .print_error("Resource exhausted. You may have reached your quota limit."),
        ErrorKind::InvalidCredential | ErrorKind::Other => {
            let mut message = format!("Error communicating with Gemini AI: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
            renderer.print_error(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::config::ChatConfig;
    use crate::chat::render::{FAILURE_NOTICE, PlainTextRenderer};
    use crate::credential::Credential;
    use crate::types::{Content, Model, ModelInfo};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    struct Scripted(VecDeque<Result<Input>>);

    impl Scripted {
        fn lines(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| Ok(Input::Line(l.to_string()))).collect())
        }
    }

    impl LineSource for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Result<Input> {
            self.0.pop_front().unwrap_or(Ok(Input::EndOfInput))
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }

        async fn send(&self, _model: &Model, _history: &[Content], text: &str) -> Result<String> {
            self.sent.lock().unwrap().push(text.to_string());
            match text {
                "restricted" => Err(Error::permission("PERMISSION_DENIED")),
                "broke" => Err(Error::io("socket closed", io::Error::other("reset by peer"))),
                "expired" => Err(Error::authentication("API_KEY_INVALID")),
                _ => Ok(format!("re: {text}")),
            }
        }
    }

    async fn drive(lines: Scripted) -> (Result<LoopExit>, Vec<String>, String, String) {
        let mut session = ChatSession::connect_with(
            &Credential::new("k".repeat(32)),
            Recorder::default(),
            ChatConfig::new().without_color(),
        )
        .await
        .ok()
        .unwrap();
        let mut input = lines;
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = {
            let mut renderer = PlainTextRenderer::with_writers(&mut out, &mut err, false);
            run(&mut session, &mut input, &mut renderer, &Interrupt::new()).await
        };
        let sent = session.transport().sent.lock().unwrap().clone();
        (
            result,
            sent,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[tokio::test]
    async fn quit_variants_never_send() {
        for word in ["EXIT", "Exit", " exit ", "quit", "Bye"] {
            let (result, sent, out, _) = drive(Scripted::lines(&[word, "Hi"])).await;
            assert_eq!(result.unwrap(), LoopExit::Quit);
            assert!(sent.is_empty());
            assert!(out.contains("Goodbye"));
        }
    }

    #[tokio::test]
    async fn empty_input_is_silent() {
        let (result, sent, out, err) = drive(Scripted::lines(&["", "   ", "quit"])).await;
        assert_eq!(result.unwrap(), LoopExit::Quit);
        assert!(sent.is_empty());
        assert_eq!(out, "\nThank you for chatting! Goodbye.\n");
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn generic_error_includes_cause() {
        let (result, sent, out, err) = drive(Scripted::lines(&["broke", "after"])).await;
        assert_eq!(result.unwrap(), LoopExit::EndOfInput);
        assert_eq!(sent, vec!["broke", "after"]);
        assert!(err.contains("Error communicating with Gemini AI"));
        assert!(err.contains("caused by: reset by peer"));
        assert!(out.contains(FAILURE_NOTICE));
        assert!(out.contains("Gemini: re: after"));
    }

    #[tokio::test]
    async fn fatal_error_stops_loop() {
        let (result, sent, _, _) = drive(Scripted::lines(&["fine", "expired", "never"])).await;
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(sent, vec!["fine", "expired"]);
    }

    #[tokio::test]
    async fn read_errors_do_not_stop_loop() {
        let mut lines = Scripted::lines(&["Hi"]);
        lines.0.push_front(Err(Error::input("terminal hiccup")));
        let (result, sent, out, err) = drive(lines).await;
        assert_eq!(result.unwrap(), LoopExit::EndOfInput);
        assert_eq!(sent, vec!["Hi"]);
        assert!(err.contains("terminal hiccup"));
        assert!(out.contains("Let's continue our conversation."));
    }

    #[tokio::test]
    async fn persistent_read_errors_end_loop() {
        let failures = (0..MAX_READ_FAILURES + 3).map(|_| Err(Error::input("EIO")));
        let (result, sent, _, err) = drive(Scripted(failures.collect())).await;
        let err_result = result.unwrap_err();
        assert!(err_result.to_string().contains("EIO"));
        assert!(sent.is_empty());
        assert_eq!(err.matches("An error occurred").count(), MAX_READ_FAILURES - 1);
    }

    #[tokio::test]
    async fn ctrl_c_at_prompt_exits_cleanly() {
        let mut lines = Scripted::lines(&["Hi"]);
        lines.0.push_front(Ok(Input::Interrupted));
        let (result, sent, out, _) = drive(lines).await;
        assert_eq!(result.unwrap(), LoopExit::Interrupted);
        assert!(sent.is_empty());
        assert!(out.contains("Interrupted by user"));
    }
}
