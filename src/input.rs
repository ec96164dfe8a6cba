//! Line-oriented terminal input.
//!
//! The chat loop and the credential prompt read through [`LineSource`] so
//! they can be driven by a script in tests and by rustyline at the terminal.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::Result;

/// The outcome of reading one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line of text, without the trailing newline.
    Line(String),
    /// The user pressed Ctrl-C at the prompt.
    Interrupted,
    /// The input stream is closed (Ctrl-D or end of a pipe).
    EndOfInput,
}

/// A source of prompted input lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line.
    fn read_line(&mut self, prompt: &str) -> Result<Input>;

    /// Records a line in the source's history, if it keeps one.
    fn add_history(&mut self, line: &str) {
        _ = line;
    }
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match self.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::EndOfInput),
            Err(err) => Err(err.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.add_history_entry(line) {
            tracing::debug!("could not record history entry: {err}");
        }
    }
}
