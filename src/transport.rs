//! The seam between the chat session and the remote service.

use async_trait::async_trait;

use crate::client::Gemini;
use crate::error::{Error, Result};
use crate::types::{Content, GenerateContentRequest, Model, ModelInfo};

/// Upper bound on `models.list` pages fetched when verifying a credential.
const MAX_MODEL_PAGES: usize = 20;

/// A conversational model reachable over some transport.
///
/// The session owns the history and hands it over on every call, so an
/// implementation keeps no conversation state of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Lists the models available to the configured credential, across all
    /// pages.
    ///
    /// Used once at startup so that a bad credential surfaces before the
    /// first turn.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Sends `text` with `history` as context and returns the reply text.
    async fn send(&self, model: &Model, history: &[Content], text: &str) -> Result<String>;
}

#[async_trait]
impl Transport for Gemini {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_MODEL_PAGES {
            let page = Gemini::list_models(self, page_token.as_deref()).await?;
            let more = page.has_more();
            models.extend(page.models);
            if !more {
                return Ok(models);
            }
            page_token = page.next_page_token;
        }
        tracing::warn!("model listing truncated after {MAX_MODEL_PAGES} pages");
        Ok(models)
    }

    async fn send(&self, model: &Model, history: &[Content], text: &str) -> Result<String> {
        let request = GenerateContentRequest::from_history(history, text);
        let response = self.generate_content(model, &request).await?;
        match response.text() {
            Some(text) => Ok(text),
            None => Err(Error::empty_response(response.missing_text_reason())),
        }
    }
}
