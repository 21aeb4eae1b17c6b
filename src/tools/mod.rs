//! Tools and the tool registry
//!
//! A tool is a named, schema-validated capability. Tools are grouped into
//! registries; each capability provider exposes exactly one registry.
//! - `schema`: parameter specs and argument validation
//! - `catalog`: the built-in static capability catalogs

pub mod catalog;
mod schema;

pub use schema::{ParamSpec, ParamType, ToolSchema, ValidatedArgs};

use crate::core::ToolError;
use crate::llm::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name (unique within its registry)
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the ordered parameter schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with arguments already validated against `schema()`
    async fn execute(&self, args: ValidatedArgs) -> Result<Value>;

    /// Describe the tool for listings and prompts
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            schema: self.schema(),
        }
    }
}

/// Transport-independent description of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ToolSchema,
}

impl ToolDescriptor {
    /// Convert to LLM tool definition
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.to_json_schema(),
        }
    }
}

/// Registry of tools, listed in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, failing on the first duplicate name
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. Names are unique within one registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateName(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors of all tools, in registration order
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments and run a tool by name
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let Some(tool) = self.get(name) else {
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let validated = tool.schema().validate(name, &args)?;
        tracing::debug!(tool = %name, args = %args, "Invoking tool");

        tool.execute(validated)
            .await
            .map_err(|e| ToolError::execution(name, format!("{:#}", e)))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
