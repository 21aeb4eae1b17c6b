//! MCP stdio client transport.
//!
//! Spawns a child process and exchanges newline-delimited JSON-RPC over its
//! stdin/stdout. Requests are strictly sequential: one request is written and
//! its response read before the next request may start.

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Failure of a single request on an established connection
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error talking to MCP server: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed MCP message: {0}")]
    Protocol(String),

    #[error("MCP server closed the connection")]
    Closed,

    #[error(transparent)]
    Rpc(#[from] JsonRpcError),
}

/// STDIO transport for MCP servers (async)
pub struct StdioTransport {
    /// Child process; taken on shutdown
    child: std::sync::Mutex<Option<Child>>,
    next_id: AtomicU64,
    /// Stdin writer and stdout reader, locked together per request
    io: Mutex<(ChildStdin, BufReader<ChildStdout>)>,
}

impl StdioTransport {
    /// Spawn a new MCP server process
    pub fn spawn(command: &str, args: &[String], env: &HashMap<String, String>) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        for (key, value) in env {
            cmd.env(key, expand_env_vars(value));
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn MCP server: {}", command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to get stdout"))?;

        Ok(Self {
            child: std::sync::Mutex::new(Some(child)),
            next_id: AtomicU64::new(1),
            io: Mutex::new((stdin, BufReader::new(stdout))),
        })
    }

    /// Send a request and wait for its response
    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        let request_str =
            serde_json::to_string(&request).map_err(|e| TransportError::Protocol(e.to_string()))?;
        tracing::debug!("MCP request: {}", request_str);

        let mut io = self.io.lock().await;
        let (stdin, stdout) = &mut *io;
        stdin.write_all(request_str.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;

        // Skip anything that is not the response to this request (server
        // notifications, blank lines)
        let response = loop {
            let mut line = String::new();
            if stdout.read_line(&mut line).await? == 0 {
                return Err(TransportError::Closed);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tracing::debug!("MCP response: {}", line);

            let response: JsonRpcResponse = serde_json::from_str(line)
                .map_err(|e| TransportError::Protocol(format!("{}: {}", e, line)))?;
            if response.id == json!(id) {
                break response;
            }
        };

        if let Some(error) = response.error {
            return Err(TransportError::Rpc(error));
        }
        response
            .result
            .ok_or_else(|| TransportError::Protocol("response missing result".to_string()))
    }

    /// Send a notification (no response expected)
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), TransportError> {
        let notification = JsonRpcRequest::notification(method, params);
        let notification_str = serde_json::to_string(&notification)
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        tracing::debug!("MCP notification: {}", notification_str);

        let mut io = self.io.lock().await;
        let stdin = &mut io.0;
        stdin.write_all(notification_str.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Check if the child process is still running
    pub fn is_alive(&self) -> bool {
        let Ok(mut guard) = self.child.lock() else {
            return false;
        };
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill the child process. Synchronous so it can run from `Drop`;
    /// calling it more than once is a no-op.
    pub fn shutdown(&self) {
        let child = match self.child.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut child) = child {
            if let Err(e) = child.start_kill() {
                tracing::debug!("MCP server already exited: {}", e);
            }
        }
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

static ENV_REF: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").ok());

/// Expand environment variable references like ${VAR} in a string.
/// Unset variables are left as written.
pub fn expand_env_vars(input: &str) -> String {
    let Some(re) = ENV_REF.as_ref() else {
        return input.to_string();
    };

    let mut result = input.to_string();
    for cap in re.captures_iter(input) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }
    result
}
