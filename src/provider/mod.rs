//! Capability providers
//!
//! A capability provider is a named bundle of tools reachable through a
//! session. Tools are only invocable while the session is open.
//! - `local`: tools served from an in-process registry
//! - `mcp`: tools served by a child process over MCP stdio
//! - `session`: scoped session acquisition with guaranteed release

mod local;
mod mcp;
mod session;

pub use local::LocalProvider;
pub use mcp::{McpLaunch, McpProvider, DEFAULT_MCP_TIMEOUT_SECS};
pub use session::SessionGuard;

use crate::config::ProviderConfig;
use crate::core::{InvokeError, SessionError};
use crate::tools::{catalog, ToolDescriptor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a provider session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}

/// A named bundle of tools behind a session-scoped connection
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Provider name, unique within one supervisor
    fn name(&self) -> &str;

    fn state(&self) -> SessionState;

    /// Establish the connection. Fails if the session is already open or
    /// the connection cannot be made.
    async fn open_session(&self) -> Result<(), SessionError>;

    /// Release the connection. Idempotent; always leaves the provider Closed.
    fn close_session(&self);

    /// Tools offered by the open session, in registration order
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError>;

    /// Invoke a tool on the open session
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value, InvokeError>;
}

/// Build a provider from its configuration entry
pub fn from_config(name: &str, config: &ProviderConfig) -> Result<Arc<dyn CapabilityProvider>> {
    let provider: Arc<dyn CapabilityProvider> = match config {
        ProviderConfig::Builtin { catalog: catalog_name } => {
            let registry = catalog::registry(catalog_name)
                .ok_or_else(|| anyhow::anyhow!("Unknown catalog: {}", catalog_name))?
                .with_context(|| format!("Failed to build catalog '{}'", catalog_name))?;
            Arc::new(LocalProvider::new(name, registry))
        }
        ProviderConfig::SelfHosted { catalog: catalog_name } => {
            if catalog::registry(catalog_name).is_none() {
                anyhow::bail!("Unknown catalog: {}", catalog_name);
            }
            Arc::new(McpProvider::new(name, McpLaunch::self_hosted(catalog_name)?))
        }
        ProviderConfig::Stdio {
            command,
            args,
            env,
            timeout_secs,
        } => Arc::new(
            McpProvider::new(
                name,
                McpLaunch {
                    command: command.clone(),
                    args: args.clone(),
                    env: env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                },
            )
            .with_timeout(Duration::from_secs(*timeout_secs)),
        ),
    };
    Ok(provider)
}
