//! In-process capability provider

use super::{CapabilityProvider, SessionState};
use crate::core::{InvokeError, SessionError};
use crate::tools::{ToolDescriptor, ToolRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// Provider backed directly by a [`ToolRegistry`]
pub struct LocalProvider {
    name: String,
    registry: ToolRegistry,
    state: Mutex<SessionState>,
}

impl LocalProvider {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            registry,
            state: Mutex::new(SessionState::Unopened),
        }
    }

    fn set_state(&self, next: SessionState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn require_open(&self) -> Result<(), SessionError> {
        if self.state().is_open() {
            Ok(())
        } else {
            Err(SessionError::NotOpen(self.name.clone()))
        }
    }
}

#[async_trait]
impl CapabilityProvider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SessionState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    async fn open_session(&self) -> Result<(), SessionError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.is_open() {
            return Err(SessionError::AlreadyOpen(self.name.clone()));
        }
        *state = SessionState::Open;
        tracing::debug!(provider = %self.name, "Session opened");
        Ok(())
    }

    fn close_session(&self) {
        if self.state().is_open() {
            tracing::debug!(provider = %self.name, "Session closed");
        }
        self.set_state(SessionState::Closed);
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.require_open()?;
        Ok(self.registry.list_tools())
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, InvokeError> {
        self.require_open()?;
        Ok(self.registry.invoke(tool, args).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolError;
    use crate::tools::catalog;
    use serde_json::json;

    fn provider() -> LocalProvider {
        LocalProvider::new("team", catalog::registry("team_management").unwrap().unwrap())
    }

    #[tokio::test]
    async fn test_invoke_requires_open_session() {
        let provider = provider();
        let err = provider
            .invoke("get_team_members", json!({"group_engagement": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err, InvokeError::Session(SessionError::NotOpen("team".into())));
        assert!(provider.list_tools().await.is_err());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let provider = provider();
        assert_eq!(provider.state(), SessionState::Unopened);

        provider.open_session().await.unwrap();
        assert_eq!(provider.state(), SessionState::Open);
        assert_eq!(
            provider.open_session().await.unwrap_err(),
            SessionError::AlreadyOpen("team".into())
        );

        let tools = provider.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "get_team_members");

        provider.close_session();
        provider.close_session();
        assert_eq!(provider.state(), SessionState::Closed);

        // A closed provider can be opened again for the next invocation
        provider.open_session().await.unwrap();
        assert!(provider.state().is_open());
    }

    #[tokio::test]
    async fn test_tool_errors_pass_through() {
        let provider = provider();
        provider.open_session().await.unwrap();
        let err = provider.invoke("get_weather", json!({})).await.unwrap_err();
        assert_eq!(err, InvokeError::Tool(ToolError::UnknownTool("get_weather".into())));
        assert!(!err.is_fatal());
    }
}
