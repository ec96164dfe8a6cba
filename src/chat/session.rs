//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! history and sends each turn through a [`Transport`].

use crate::chat::config::ChatConfig;
use crate::client::Gemini;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::observability::{CHAT_RESETS, CHAT_TURN_ERRORS, CHAT_TURNS};
use crate::transport::Transport;
use crate::types::{Content, Model};

/// The ordered turns of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Content>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the turns so far, oldest first.
    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Records a completed exchange.
    fn push_exchange(&mut self, user: &str, reply: &str) {
        self.turns.push(Content::user(user));
        self.turns.push(Content::model(reply));
    }
}

/// A chat session that manages conversation state and API interactions.
///
/// A session only exists once setup has succeeded; there is no partially
/// connected state.
pub struct ChatSession<T: Transport> {
    transport: T,
    config: ChatConfig,
    conversation: Conversation,
}

impl ChatSession<Gemini> {
    /// Connects to the Gemini API.
    ///
    /// Checks the credential format, builds the client, and verifies the
    /// credential by listing models. Every error returned here is fatal to
    /// the program.
    pub async fn connect(credential: &Credential, config: ChatConfig) -> Result<Self> {
        check_format(credential)?;
        let client = Gemini::with_options(
            credential.clone(),
            config.base_url.clone(),
            Some(config.timeout),
        )?;
        Self::verify(client, config).await
    }
}

impl<T: Transport> ChatSession<T> {
    /// Connects through a caller-supplied transport.
    pub async fn connect_with(credential: &Credential, transport: T, config: ChatConfig) -> Result<Self> {
        check_format(credential)?;
        Self::verify(transport, config).await
    }

    async fn verify(transport: T, config: ChatConfig) -> Result<Self> {
        let models = transport.list_models().await.map_err(|err| {
            tracing::warn!("credential verification failed: {err}");
            err
        })?;
        tracing::debug!(available = models.len(), "credential verified");
        if !models.is_empty() && !models.iter().any(|m| m.id() == config.model.as_str()) {
            tracing::warn!("model {} was not in the model listing", config.model);
        }
        tracing::info!("Successfully connected to {} model.", config.model);
        Ok(Self {
            transport,
            config,
            conversation: Conversation::new(),
        })
    }

    /// Sends a user message and returns the model's reply.
    ///
    /// The exchange is appended to the history only on success; a failed
    /// turn leaves the conversation exactly as it was. Callers decide what
    /// to do with the error by way of [`Error::is_fatal`].
    pub async fn send(&mut self, text: &str) -> Result<String> {
        CHAT_TURNS.click();
        tracing::debug!(history = self.conversation.len(), "sending turn");
        match self
            .transport
            .send(&self.config.model, self.conversation.turns(), text)
            .await
        {
            Ok(reply) => {
                self.conversation.push_exchange(text, &reply);
                Ok(reply)
            }
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                tracing::warn!(kind = ?err.kind(), "turn failed: {err}");
                Err(err)
            }
        }
    }

    /// Discards the conversation and starts a new, empty one.
    pub fn reset(&mut self) {
        CHAT_RESETS.click();
        tracing::debug!(discarded = self.conversation.len(), "conversation reset");
        self.conversation = Conversation::new();
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the number of completed exchanges.
    pub fn turn_count(&self) -> usize {
        self.conversation.len() / 2
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn check_format(credential: &Credential) -> Result<()> {
    if credential.is_valid_format() {
        Ok(())
    } else {
        Err(Error::credential("The API key format appears to be invalid."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelInfo, Role};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        listing: Mutex<Option<Result<Vec<ModelInfo>>>>,
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<(Vec<Content>, String)>>,
    }

    impl FakeTransport {
        fn replying(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn failing_listing(err: Error) -> Self {
            Self {
                listing: Mutex::new(Some(Err(err))),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<(Vec<Content>, String)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            self.listing.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }

        async fn send(&self, _model: &Model, history: &[Content], text: &str) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((history.to_vec(), text.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("echo: {text}")))
        }
    }

    fn credential() -> Credential {
        Credential::new("a".repeat(40))
    }

    async fn session(transport: FakeTransport) -> ChatSession<FakeTransport> {
        ChatSession::connect_with(&credential(), transport, ChatConfig::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn connect_rejects_bad_format_before_any_call() {
        let transport = FakeTransport::failing_listing(Error::internal_server("unreachable"));
        let err = ChatSession::connect_with(&Credential::new("short"), transport, ChatConfig::new())
            .await
            .err()
            .unwrap();
        assert!(err.is_credential());
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn connect_surfaces_invalid_credential() {
        let transport = FakeTransport::failing_listing(Error::authentication("API_KEY_INVALID"));
        let err = ChatSession::connect_with(&credential(), transport, ChatConfig::new())
            .await
            .err()
            .unwrap();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn connect_fails_on_any_listing_error() {
        let transport = FakeTransport::failing_listing(Error::timeout("slow", None));
        let result = ChatSession::connect_with(&credential(), transport, ChatConfig::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn connect_reaches_ready_state() {
        let session = session(FakeTransport::default()).await;
        assert!(session.conversation().is_empty());
        assert_eq!(session.model(), &Model::default());
    }

    #[tokio::test]
    async fn send_accumulates_history() {
        let mut session = session(FakeTransport::replying(vec![
            Ok("Hello there".to_string()),
            Ok("Fine".to_string()),
        ]))
        .await;

        assert_eq!(session.send("Hi").await.unwrap(), "Hello there");
        assert_eq!(session.send("How are you?").await.unwrap(), "Fine");
        assert_eq!(session.turn_count(), 2);

        let requests = session.transport().requests();
        assert!(requests[0].0.is_empty());
        assert_eq!(
            requests[1].0,
            vec![Content::user("Hi"), Content::model("Hello there")]
        );
        assert_eq!(requests[1].1, "How are you?");
        assert_eq!(
            session.conversation().turns()[3].role,
            Some(Role::Model)
        );
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let mut session = session(FakeTransport::replying(vec![
            Ok("one".to_string()),
            Err(Error::quota_exhausted("quota", None)),
            Ok("three".to_string()),
        ]))
        .await;

        session.send("first").await.unwrap();
        let before = session.conversation().clone();
        let err = session.send("second").await.unwrap_err();
        assert!(err.is_quota_exhausted());
        assert_eq!(session.conversation(), &before);

        session.send("third").await.unwrap();
        let requests = session.transport().requests();
        assert_eq!(requests[2].0, before.turns());
    }

    #[tokio::test]
    async fn reset_clears_history_for_next_request() {
        let mut session = session(FakeTransport::default()).await;
        session.send("remember this").await.unwrap();
        session.send("and this").await.unwrap();

        session.reset();
        assert!(session.conversation().is_empty());

        session.send("hello").await.unwrap();
        let requests = session.transport().requests();
        let (history, text) = requests.last().unwrap();
        assert!(history.is_empty());
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn invalid_credential_mid_conversation_is_fatal() {
        let mut session = session(FakeTransport::replying(vec![
            Ok("ok".to_string()),
            Ok("ok".to_string()),
            Err(Error::authentication("API key expired")),
        ]))
        .await;
        session.send("a").await.unwrap();
        session.send("b").await.unwrap();
        let err = session.send("c").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
