//! MCP stdio server.
//!
//! Serves one [`ToolRegistry`] over newline-delimited JSON-RPC 2.0. Each
//! non-empty input line is one request; each response is written as one line.
//! Routed methods:
//! - `initialize`: server info and capabilities
//! - `notifications/*`: acknowledged silently
//! - `ping`
//! - `tools/list`: registered tools in registration order
//! - `tools/call`: validated invocation through the registry

use super::types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpToolDef, McpToolResult, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::core::ToolError;
use crate::tools::ToolRegistry;
use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP server exposing a tool registry
pub struct McpServer {
    name: String,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    /// Run the server loop until `input` reaches EOF
    pub async fn run(
        &self,
        input: impl AsyncBufRead + Unpin,
        mut output: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        tracing::info!(server = %self.name, tools = self.registry.len(), "MCP server started");
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(req) => req,
                Err(e) => {
                    tracing::warn!("Unparseable request: {}", e);
                    let error = JsonRpcError::new(PARSE_ERROR, "Parse error");
                    write_response(&mut output, &JsonRpcResponse::failure(Value::Null, error))
                        .await?;
                    continue;
                }
            };

            // Notifications get no response
            let Some(id) = request.id else {
                tracing::debug!(method = %request.method, "Notification received");
                continue;
            };

            let response = self.handle(id, &request.method, request.params).await;
            write_response(&mut output, &response).await?;
        }

        tracing::info!(server = %self.name, "MCP server input closed");
        Ok(())
    }

    async fn handle(&self, id: Value, method: &str, params: Option<Value>) -> JsonRpcResponse {
        match method {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": self.name,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                let tools: Vec<McpToolDef> = self
                    .registry
                    .list_tools()
                    .iter()
                    .map(McpToolDef::from)
                    .collect();
                JsonRpcResponse::success(id, json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(id, params).await,
            other => JsonRpcResponse::failure(
                id,
                JsonRpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", other)),
            ),
        }
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(p)) => p,
            Ok(None) => {
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(INVALID_PARAMS, "tools/call requires params"),
                )
            }
            Err(e) => {
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(INVALID_PARAMS, format!("Invalid tools/call params: {}", e)),
                )
            }
        };

        tracing::info!(tool = %params.name, "Tool call");
        match self.registry.invoke(&params.name, params.arguments).await {
            Ok(value) => {
                let result = McpToolResult::json(&value);
                JsonRpcResponse::success(id, json!(result))
            }
            Err(ToolError::Execution { message, .. }) => {
                JsonRpcResponse::success(id, json!(McpToolResult::error(message)))
            }
            Err(other) => JsonRpcResponse::failure(id, JsonRpcError::from_tool_error(&other)),
        }
    }
}

async fn write_response(
    output: &mut (impl AsyncWrite + Unpin),
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog;
    use tokio::io::BufReader;

    async fn exchange(catalog_name: &str, input: &str) -> Vec<Value> {
        let registry = catalog::registry(catalog_name).unwrap().unwrap();
        let server = McpServer::new(catalog::server_name(catalog_name), registry);
        let mut output = Vec::new();
        server
            .run(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_handshake_and_listing() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let responses = exchange("service_desk", input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "Service Desk MCP");
        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools[0]["name"], "get_active_tickets");
        assert_eq!(tools[1]["name"], "get_system_status");
    }

    #[tokio::test]
    async fn test_call_returns_json_text() {
        let input = r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"get_team_members","arguments":{"group_engagement":"Office USA"}}}"#;
        let responses = exchange("team_management", input).await;
        let result: McpToolResult = serde_json::from_value(responses[0]["result"].clone()).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.to_value()["group"], "Office USA");
    }

    #[tokio::test]
    async fn test_call_failures_are_typed() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_weather"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_team_members","arguments":{}}}"#,
            "\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#,
        );
        let responses = exchange("team_management", input).await;
        assert_eq!(responses[0]["error"]["data"]["kind"], "unknown_tool");
        assert_eq!(responses[1]["error"]["data"]["kind"], "validation");
        assert_eq!(responses[2]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[3]["error"]["code"], METHOD_NOT_FOUND);
    }
}
