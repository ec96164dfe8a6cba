//! Obtaining and checking the Gemini API key.
//!
//! The key comes from the `GEMINI_API_KEY` environment variable or, failing
//! that, from an interactive prompt. A prompted key may be appended to a
//! local settings file. That file is plain text: keys written there are
//! neither deduplicated nor encrypted.

use std::env;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::input::{Input, LineSource};

/// Environment variable that carries the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = ".env";

/// Where to obtain a key.
pub const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

/// Shortest key accepted by [`is_valid_format`].
pub const MIN_KEY_LEN: usize = 30;

/// An opaque access token for the Gemini API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token. No validation is performed.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the token looks plausible; see [`is_valid_format`].
    pub fn is_valid_format(&self) -> bool {
        is_valid_format(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// Syntactic sanity check for an API key.
///
/// Accepts tokens of at least [`MIN_KEY_LEN`] characters drawn from
/// `[A-Za-z0-9_-]`. Revoked, expired, or under-privileged keys pass this
/// check; only the API can reject those.
pub fn is_valid_format(token: &str) -> bool {
    token.len() >= MIN_KEY_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Appends one `NAME=value` line to the settings file at `path`.
pub fn append_setting(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))?;
    write!(file, "\n{name}={value}\n")
        .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))
}

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Resolves the credential from the environment or the user.
pub struct CredentialResolver {
    lookup: Lookup,
    settings_path: PathBuf,
}

impl CredentialResolver {
    /// Creates a resolver that reads the process environment and saves to `.env`.
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|name| env::var(name).ok()),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
        }
    }

    /// Replaces the environment lookup.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Sets the file an opted-in key is appended to.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    /// Returns the credential.
    ///
    /// An environment value is returned as found. Otherwise the user is
    /// prompted; an empty answer is returned unchanged for the caller to
    /// reject. Fails only when the prompt itself cannot be answered.
    pub fn resolve(&self, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<Credential> {
        if let Some(token) = (self.lookup)(API_KEY_ENV).filter(|token| !token.is_empty()) {
            tracing::debug!("using API key from {API_KEY_ENV}");
            return Ok(Credential::new(token));
        }

        let rule = "=".repeat(50);
        writeln!(out, "\n{rule}")?;
        writeln!(out, "No valid API key found in environment variables.")?;
        writeln!(out, "You need a valid Google AI Studio API key to use this chatbot.")?;
        writeln!(out, "Visit: {API_KEY_URL} to get your API key.")?;
        writeln!(out, "{rule}\n")?;
        out.flush()?;

        let token = prompt(input, "Please enter your Gemini API key: ")?;
        let token = token.trim().to_string();

        let answer = prompt(input, "Save this API key for future sessions? (y/n): ")?;
        if answer.trim().eq_ignore_ascii_case("y") {
            self.save(&token, out)?;
        }

        Ok(Credential::new(token))
    }

    fn save(&self, token: &str, out: &mut dyn Write) -> Result<()> {
        let path = &self.settings_path;
        match append_setting(path, API_KEY_ENV, token) {
            Ok(()) => {
                tracing::info!("saved API key to {}", path.display());
                writeln!(out, "API key saved to {} file.", path.display())?;
                writeln!(out, "To load it automatically, use: ")?;
                if cfg!(windows) {
                    writeln!(out, "    a dotenv loader, or `setx {API_KEY_ENV} your_key`")?;
                } else {
                    writeln!(
                        out,
                        "    Add 'export {API_KEY_ENV}=your_key' to your .bashrc or .zshrc file"
                    )?;
                }
            }
            Err(err) => {
                tracing::warn!("could not save API key: {err}");
                writeln!(out, "Could not save API key: {err}")?;
            }
        }
        Ok(())
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt(input: &mut dyn LineSource, question: &str) -> Result<String> {
    match input.read_line(question)? {
        Input::Line(line) => Ok(line),
        Input::Interrupted => Err(Error::credential("API key prompt was interrupted")),
        Input::EndOfInput => Err(Error::credential(
            "input closed before an API key was entered",
        )),
    }
}
