use serde::{Deserialize, Serialize};

use crate::types::ModelInfo;

/// Response from the list models API endpoint.
///
/// Contains a page of available models and the token for the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListResponse {
    /// List of models returned by the API.
    #[serde(default)]
    pub models: Vec<ModelInfo>,

    /// Token for retrieving the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ModelListResponse {
    /// Get the list of models.
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Check if there are more results available.
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}
