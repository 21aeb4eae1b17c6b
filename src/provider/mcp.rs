//! Capability provider served by a child process over MCP stdio

use super::{CapabilityProvider, SessionState};
use crate::core::{InvokeError, SessionError, ToolError};
use crate::mcp::types::PROTOCOL_VERSION;
use crate::mcp::{McpToolDef, McpToolResult, StdioTransport, TransportError};
use crate::tools::ToolDescriptor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Default limit for the handshake and for each tool call (30 seconds)
pub const DEFAULT_MCP_TIMEOUT_SECS: u64 = 30;

/// How to start the provider process
#[derive(Debug, Clone, PartialEq)]
pub struct McpLaunch {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl McpLaunch {
    /// Run a built-in catalog through this executable's `provider` subcommand
    pub fn self_hosted(catalog: &str) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the conductor executable")?;
        Ok(Self {
            command: exe.to_string_lossy().into_owned(),
            args: vec!["provider".to_string(), catalog.to_string()],
            env: HashMap::new(),
        })
    }
}

struct Connection {
    transport: Arc<StdioTransport>,
    tools: Vec<ToolDescriptor>,
}

struct Inner {
    state: SessionState,
    connection: Option<Connection>,
}

/// Provider whose tools live in an MCP server process.
///
/// Opening a session spawns the process and performs the handshake; closing
/// kills it. The handshake and every tool call are bounded by `timeout`.
pub struct McpProvider {
    name: String,
    launch: McpLaunch,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl McpProvider {
    pub fn new(name: impl Into<String>, launch: McpLaunch) -> Self {
        Self {
            name: name.into(),
            launch,
            timeout: Duration::from_secs(DEFAULT_MCP_TIMEOUT_SECS),
            inner: Mutex::new(Inner {
                state: SessionState::Unopened,
                connection: None,
            }),
        }
    }

    /// Set the handshake and tool-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> SessionError {
        SessionError::ProviderUnavailable {
            provider: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn transport(&self) -> Result<Arc<StdioTransport>, SessionError> {
        let inner = self.lock();
        match (&inner.state, &inner.connection) {
            (SessionState::Open, Some(conn)) => Ok(conn.transport.clone()),
            _ => Err(SessionError::NotOpen(self.name.clone())),
        }
    }

    /// Spawn, initialize and discover tools
    async fn connect(&self) -> Result<Connection, SessionError> {
        let transport =
            StdioTransport::spawn(&self.launch.command, &self.launch.args, &self.launch.env)
                .map_err(|e| self.unavailable(format!("{:#}", e)))?;

        let handshake = async {
            transport
                .request(
                    "initialize",
                    Some(json!({
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": {},
                        "clientInfo": {
                            "name": "conductor",
                            "version": env!("CARGO_PKG_VERSION")
                        }
                    })),
                )
                .await?;
            transport.notify("notifications/initialized", None).await?;

            let listing = transport.request("tools/list", None).await?;
            let defs: Vec<McpToolDef> = listing
                .get("tools")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| TransportError::Protocol(format!("bad tools/list result: {}", e)))?
                .unwrap_or_default();
            Ok::<_, TransportError>(defs)
        };

        match tokio::time::timeout(self.timeout, handshake).await {
            Ok(Ok(defs)) => Ok(Connection {
                transport: Arc::new(transport),
                tools: defs.into_iter().map(McpToolDef::into_descriptor).collect(),
            }),
            Ok(Err(e)) => {
                transport.shutdown();
                Err(self.unavailable(e))
            }
            Err(_) => {
                transport.shutdown();
                Err(self.unavailable(format!(
                    "no handshake reply within {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }
}

#[async_trait]
impl CapabilityProvider for McpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SessionState {
        self.lock().state
    }

    async fn open_session(&self) -> Result<(), SessionError> {
        if self.state().is_open() {
            return Err(SessionError::AlreadyOpen(self.name.clone()));
        }

        tracing::debug!(
            provider = %self.name,
            command = %self.launch.command,
            "Starting MCP provider"
        );
        let connection = self.connect().await?;
        tracing::info!(provider = %self.name, tools = connection.tools.len(), "MCP session opened");

        let mut inner = self.lock();
        if inner.state.is_open() {
            connection.transport.shutdown();
            return Err(SessionError::AlreadyOpen(self.name.clone()));
        }
        inner.connection = Some(connection);
        inner.state = SessionState::Open;
        Ok(())
    }

    fn close_session(&self) {
        let mut inner = self.lock();
        if let Some(conn) = inner.connection.take() {
            conn.transport.shutdown();
            tracing::debug!(provider = %self.name, "MCP session closed");
        }
        inner.state = SessionState::Closed;
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        let inner = self.lock();
        match (&inner.state, &inner.connection) {
            (SessionState::Open, Some(conn)) => Ok(conn.tools.clone()),
            _ => Err(SessionError::NotOpen(self.name.clone())),
        }
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, InvokeError> {
        let transport = self.transport()?;

        let call = transport.request(
            "tools/call",
            Some(json!({ "name": tool, "arguments": args })),
        );
        let Ok(result) = tokio::time::timeout(self.timeout, call).await else {
            tracing::warn!(provider = %self.name, tool, "MCP tool call timed out");
            return Err(ToolError::execution(
                tool,
                format!(
                    "no reply from provider '{}' within {}s",
                    self.name,
                    self.timeout.as_secs_f64()
                ),
            )
            .into());
        };

        match result {
            Ok(value) => {
                let result: McpToolResult = serde_json::from_value(value).map_err(|e| {
                    ToolError::execution(tool, format!("malformed tool result: {}", e))
                })?;
                if result.is_error {
                    Err(ToolError::execution(tool, result.to_text()).into())
                } else {
                    Ok(result.to_value())
                }
            }
            Err(TransportError::Rpc(err)) => Err(err.into_tool_error(tool).into()),
            // The session stays open; the worker reports the failure
            Err(other) => Err(ToolError::execution(tool, other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_binary() -> McpProvider {
        McpProvider::new(
            "ghost",
            McpLaunch {
                command: "conductor-no-such-binary".into(),
                args: vec![],
                env: HashMap::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_spawn_failure_is_provider_unavailable() {
        let provider = missing_binary();
        let err = provider.open_session().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ProviderUnavailable { ref provider, .. } if provider == "ghost"
        ));
        assert!(!provider.state().is_open());
    }

    #[tokio::test]
    async fn test_closed_provider_rejects_calls() {
        let provider = missing_binary();
        provider.close_session();
        provider.close_session();
        assert_eq!(provider.state(), SessionState::Closed);

        let err = provider.invoke("anything", json!({})).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_failed_handshake_is_provider_unavailable() {
        // `true` exits without speaking the protocol
        let provider = McpProvider::new(
            "mute",
            McpLaunch {
                command: "true".into(),
                args: vec![],
                env: HashMap::new(),
            },
        );
        let err = provider.open_session().await.unwrap_err();
        assert!(matches!(err, SessionError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_handshake() {
        // `sleep` reads nothing and never answers `initialize`
        let provider = McpProvider::new(
            "silent",
            McpLaunch {
                command: "sleep".into(),
                args: vec!["600".into()],
                env: HashMap::new(),
            },
        )
        .with_timeout(Duration::from_millis(300));

        let err = tokio::time::timeout(Duration::from_secs(10), provider.open_session())
            .await
            .expect("open_session must give up on its own")
            .unwrap_err();
        match err {
            SessionError::ProviderUnavailable { provider, reason } => {
                assert_eq!(provider, "silent");
                assert!(reason.contains("no handshake reply"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(provider.state(), SessionState::Unopened);
    }

    #[tokio::test]
    async fn test_stalled_tool_call_is_absorbed_failure() {
        // Answers the handshake, then ignores every tools/call
        let script = r#"while read line; do
  case "$line" in
    *'"initialize"'*) echo '{"jsonrpc":"2.0","id":1,"result":{}}' ;;
    *'"tools/list"'*) echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[]}}' ;;
  esac
done"#;
        let provider = McpProvider::new(
            "stalled",
            McpLaunch {
                command: "sh".into(),
                args: vec!["-c".into(), script.into()],
                env: HashMap::new(),
            },
        )
        .with_timeout(Duration::from_millis(500));

        provider.open_session().await.unwrap();
        let err = provider.invoke("lookup", json!({})).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("no reply from provider 'stalled'"));
        assert!(provider.state().is_open());

        provider.close_session();
        assert_eq!(provider.state(), SessionState::Closed);
    }
}
