use serde::{Deserialize, Serialize};

/// The author of a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text written by the person at the terminal.
    User,
    /// Text produced by the model.
    Model,
}

/// A piece of a turn. Only text parts are produced or consumed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// The text of this part. Non-text parts deserialize with `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Who wrote this turn. Responses may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The parts that make up the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Creates a single-part text turn for `role`.
    pub fn new_with_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new_with_text(Role::User, text)
    }

    /// Creates a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new_with_text(Role::Model, text)
    }

    /// Concatenates the text of every part, or `None` if no part carries text.
    pub fn text(&self) -> Option<String> {
        let mut texts = self.parts.iter().filter_map(|p| p.text.as_deref()).peekable();
        texts.peek()?;
        Some(texts.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn content_serialization() {
        let content = Content::user("Hi");
        assert_eq!(
            to_value(&content).unwrap(),
            json!({"role": "user", "parts": [{"text": "Hi"}]})
        );
    }

    #[test]
    fn text_joins_parts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [{"text": "Hello "}, {"inlineData": {}}, {"text": "there"}]
        }))
        .unwrap();
        assert_eq!(content.role, Some(Role::Model));
        assert_eq!(content.text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn text_absent_without_text_parts() {
        let content: Content = serde_json::from_value(json!({"parts": []})).unwrap();
        assert_eq!(content.text(), None);
    }
}
