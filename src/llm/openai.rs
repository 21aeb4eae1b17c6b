//! OpenAI-compatible chat completions provider
//!
//! Works against any endpoint that speaks `/chat/completions` with function
//! tools. The API key is read from the environment variable named in config.

use super::{
    LlmError, LlmProvider, LlmResponse, Message, Role, TokenUsage, ToolCall, ToolDefinition,
};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::from_network_error)?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };

                let tool_calls: Vec<OpenAiToolCall> = msg
                    .tool_calls
                    .iter()
                    .map(|call| OpenAiToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect();

                // Assistant tool-call turns carry no content
                let content = if tool_calls.is_empty() {
                    Some(msg.content.clone())
                } else {
                    None
                };

                OpenAiMessage {
                    role: role.to_string(),
                    content,
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: msg.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|t| OpenAiTool {
                tool_type: "function".to_string(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn parse_response(response: OpenAiResponse) -> Result<LlmResponse, LlmError> {
        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                // Unparseable arguments go through as a string and fail validation
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect::<Vec<_>>();

        let text = choice.message.content.filter(|t| !t.is_empty());
        Ok(match (text, calls.is_empty()) {
            (Some(text), true) => LlmResponse::Text { text, usage },
            (None, true) => LlmResponse::Text {
                text: String::new(),
                usage,
            },
            (None, false) => LlmResponse::ToolCalls { calls, usage },
            (text, false) => LlmResponse::Mixed {
                text,
                tool_calls: calls,
                usage,
            },
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, LlmError> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages),
            tools: tools
                .filter(|t| !t.is_empty())
                .map(Self::convert_tools),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Chat request failed");
            return Err(LlmError::from_http_status(status, error_text));
        }

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Self::parse_response(body)
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> LlmResponse {
        let response: OpenAiResponse = serde_json::from_str(body).unwrap();
        OpenAiProvider::parse_response(response).unwrap()
    }

    #[test]
    fn test_parse_text_response_with_usage() {
        let response = parse(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "Hello"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }"#,
        );
        assert_eq!(response.text(), Some("Hello"));
        assert_eq!(response.usage().unwrap().total_tokens, 15);
    }

    #[test]
    fn test_parse_tool_calls() {
        let response = parse(
            r#"{
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_team_members", "arguments": "{\"group_engagement\":\"Office USA\"}"}
                    }]
                }}]
            }"#,
        );
        assert!(response.text().is_none());
        let call = &response.tool_calls()[0];
        assert_eq!(call.name, "get_team_members");
        assert_eq!(call.arguments, json!({"group_engagement": "Office USA"}));
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let response: OpenAiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiProvider::parse_response(response),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_convert_tool_call_turns() {
        let messages = vec![
            Message::user("status of VPN"),
            Message::assistant_tool_calls(vec![ToolCall {
                id: "call_1".into(),
                name: "get_system_status".into(),
                arguments: json!({"system_name": "VPN"}),
            }]),
            Message::tool_result("call_1", "{}"),
        ];
        let converted = OpenAiProvider::convert_messages(&messages);
        assert_eq!(converted[1].content, None);
        assert_eq!(
            converted[1].tool_calls.as_ref().unwrap()[0].function.arguments,
            r#"{"system_name":"VPN"}"#
        );
        assert_eq!(converted[2].role, "tool");
        assert_eq!(converted[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "CONDUCTOR_TEST_UNSET_KEY".into(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            OpenAiProvider::from_config(&config),
            Err(LlmError::MissingApiKey(_))
        ));
    }
}
