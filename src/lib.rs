//! A terminal chat client for Google's Gemini models.

// Public modules
pub mod chat;
pub mod client;
pub mod credential;
pub mod error;
pub mod input;
pub mod observability;
pub mod transport;
pub mod types;

// Re-exports
pub use client::Gemini;
pub use credential::{Credential, CredentialResolver};
pub use error::{Error, ErrorKind, Result};
pub use observability::register_biometrics;
pub use transport::Transport;
pub use types::*;
