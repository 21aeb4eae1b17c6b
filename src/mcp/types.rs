//! MCP protocol types and data structures.

use crate::core::ToolError;
use crate::tools::{ToolDescriptor, ToolSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Protocol revision spoken by both ends
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// Standard JSON-RPC error codes.
pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// JSON-RPC request or notification (no `id`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(id)),
            method: method.to_string(),
            params,
        }
    }

    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("MCP error {code}: {message}")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Encode a tool failure that happened before execution.
    ///
    /// `data.kind` lets the client rebuild the exact `ToolError` variant.
    pub fn from_tool_error(err: &ToolError) -> Self {
        let (kind, tool, detail) = match err {
            ToolError::UnknownTool(tool) => ("unknown_tool", tool.as_str(), ""),
            ToolError::Validation { tool, message } => {
                ("validation", tool.as_str(), message.as_str())
            }
            ToolError::DuplicateName(tool) => ("duplicate_name", tool.as_str(), ""),
            ToolError::Execution { tool, message } => {
                ("execution", tool.as_str(), message.as_str())
            }
        };
        Self {
            code: INVALID_PARAMS,
            message: err.to_string(),
            data: Some(json!({ "kind": kind, "tool": tool, "message": detail })),
        }
    }

    /// Decode back into a `ToolError`, using `tool` when the payload omits it
    pub fn into_tool_error(self, tool: &str) -> ToolError {
        let data = self.data.unwrap_or(Value::Null);
        let kind = data.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        let tool = data
            .get("tool")
            .and_then(|t| t.as_str())
            .unwrap_or(tool)
            .to_string();
        let detail = data
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(&self.message)
            .to_string();

        match kind {
            "unknown_tool" => ToolError::UnknownTool(tool),
            "validation" => ToolError::Validation { tool, message: detail },
            "duplicate_name" => ToolError::DuplicateName(tool),
            _ => ToolError::Execution {
                tool,
                message: self.message,
            },
        }
    }
}

/// Tool definition from MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDef {
    /// Tool name
    pub name: String,
    /// Tool description
    #[serde(default)]
    pub description: String,
    /// JSON Schema for input parameters
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<&ToolDescriptor> for McpToolDef {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            input_schema: descriptor.schema.to_json_schema(),
        }
    }
}

impl McpToolDef {
    pub fn into_descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            schema: ToolSchema::from_json_schema(&self.input_schema),
            name: self.name,
            description: self.description,
        }
    }
}

/// Result of a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    /// Content returned by the tool
    pub content: Vec<McpContent>,
    /// Whether the call resulted in an error
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// Content item in MCP responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McpContent {
    /// Text content
    #[serde(rename = "text")]
    Text { text: String },
    /// Resource reference
    #[serde(rename = "resource")]
    Resource { uri: String },
}

impl McpToolResult {
    /// Wrap a tool's JSON output as a single text item
    pub fn json(value: &Value) -> Self {
        Self {
            content: vec![McpContent::Text {
                text: value.to_string(),
            }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Convert to string representation
    pub fn to_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                McpContent::Text { text } => text.clone(),
                McpContent::Resource { uri } => format!("[Resource: {}]", uri),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse the text payload back to JSON; plain text becomes a JSON string
    pub fn to_value(&self) -> Value {
        let text = self.to_text();
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}
