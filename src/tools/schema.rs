//! Tool input schemas and argument validation.
//!
//! A [`ToolSchema`] is an ordered list of [`ParamSpec`]s. Order matters: it is
//! preserved in tool listings and JSON Schema output so prompts built from
//! the same registry are identical run to run.

use crate::core::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type accepted by a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ParamType::String),
            "integer" => Some(ParamType::Integer),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    /// Check whether a JSON value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One named parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
    /// Known example values, used as hints by argument inference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl ParamSpec {
    pub fn required(
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
            examples: Vec::new(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Ordered parameter list of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Validate raw arguments, filling in defaults.
    ///
    /// `null` is accepted as "no arguments". A `null` value for an optional
    /// parameter counts as absent.
    pub fn validate(&self, tool: &str, args: &Value) -> Result<ValidatedArgs, ToolError> {
        let empty = Map::new();
        let given = match args {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ToolError::validation(
                    tool,
                    format!("arguments must be an object, got {}", json_type_name(other)),
                ))
            }
        };

        if let Some(unknown) = given.keys().find(|key| self.get(key).is_none()) {
            return Err(ToolError::validation(
                tool,
                format!("unknown parameter '{}'", unknown),
            ));
        }

        let mut values = Map::new();
        for spec in &self.params {
            match given.get(&spec.name) {
                Some(Value::Null) | None => {
                    if spec.required {
                        return Err(ToolError::validation(
                            tool,
                            format!("missing required parameter '{}'", spec.name),
                        ));
                    }
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(ToolError::validation(
                            tool,
                            format!(
                                "parameter '{}' must be {}, got {}",
                                spec.name,
                                spec.kind.as_str(),
                                json_type_name(value)
                            ),
                        ));
                    }
                    values.insert(spec.name.clone(), value.clone());
                }
            }
        }

        Ok(ValidatedArgs {
            tool: tool.to_string(),
            values,
        })
    }

    /// Render as a JSON Schema object (MCP `inputSchema`, LLM function parameters)
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(spec.kind.as_str()));
            if !spec.description.is_empty() {
                prop.insert("description".into(), json!(spec.description));
            }
            if let Some(default) = &spec.default {
                prop.insert("default".into(), default.clone());
            }
            if !spec.examples.is_empty() {
                prop.insert("examples".into(), json!(spec.examples));
            }
            properties.insert(spec.name.clone(), Value::Object(prop));
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Rebuild a schema from JSON Schema received over the wire.
    ///
    /// Lenient: unknown or missing types become `string`, anything that is
    /// not an object yields an empty schema.
    pub fn from_json_schema(schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
            return Self::default();
        };

        let params = properties
            .iter()
            .map(|(name, prop)| ParamSpec {
                name: name.clone(),
                kind: prop
                    .get("type")
                    .and_then(|t| t.as_str())
                    .and_then(ParamType::parse)
                    .unwrap_or(ParamType::String),
                required: required.contains(&name.as_str()),
                default: prop.get("default").cloned(),
                description: prop
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or_default()
                    .to_string(),
                examples: prop
                    .get("examples")
                    .and_then(|e| e.as_array())
                    .map(|e| {
                        e.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        Self { params }
    }
}

/// Arguments that passed schema validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String argument, if present
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_str())
    }

    /// String argument that the schema marks as required
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.str(name).ok_or_else(|| {
            ToolError::validation(&self.tool, format!("missing required parameter '{}'", name))
        })
    }
}
