//! Scripted LLM provider for tests and demos
//!
//! Replays a queue of canned responses in order and records every request it
//! receives, so tests can assert on the exact prompt and tool list the model
//! was shown. No network, no API key.

use super::{LlmError, LlmProvider, LlmResponse, Message, Role, ToolDefinition};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the provider saw on one call
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordedRequest {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

impl RecordedRequest {
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<LlmResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a script of plain text answers
    pub fn texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(texts.into_iter().map(|t| LlmResponse::Text {
            text: t.to_string(),
            usage: None,
        }))
    }

    pub fn push(&self, response: LlmResponse) {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedRequest {
                timestamp: chrono::Utc::now(),
                messages: messages.to_vec(),
                tools: tools
                    .unwrap_or_default()
                    .iter()
                    .map(|t| t.name.clone())
                    .collect(),
            });

        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let provider = ScriptedProvider::texts(["first", "second"]);
        let messages = [Message::system("be brief"), Message::user("hi")];

        let r1 = provider.chat(&messages, None).await.unwrap();
        let r2 = provider.chat(&messages, None).await.unwrap();
        assert_eq!(r1.text(), Some("first"));
        assert_eq!(r2.text(), Some("second"));
        assert!(provider.chat(&messages, None).await.is_err());

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].system_prompt(), Some("be brief"));
        assert_eq!(requests[0].last_user_message(), Some("hi"));
    }
}
