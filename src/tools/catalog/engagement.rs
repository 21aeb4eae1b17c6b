//! Engagement catalog: component engagements of a group engagement.

use crate::tools::{ParamSpec, ParamType, Tool, ToolSchema, ValidatedArgs};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

const COMPONENT_ENGAGEMENTS: &[&str] = &["India", "Kochi", "Chennai", "Mumbai"];

pub struct GetComponentEngagementsTool;

#[async_trait]
impl Tool for GetComponentEngagementsTool {
    fn name(&self) -> &str {
        "get_component_engagements"
    }

    fn description(&self) -> &str {
        "Get the component engagements for a specific group engagement"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(ParamSpec::required(
            "group_engagement",
            ParamType::String,
            "The name of the group to get engagements for",
        ))
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let group = args.require_str("group_engagement")?;
        tracing::info!(group = %group, "Getting component engagements");
        Ok(json!({
            "group": group,
            "engagements": COMPONENT_ENGAGEMENTS,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_group() {
        let tool = GetComponentEngagementsTool;
        let args = tool
            .schema()
            .validate(tool.name(), &json!({"group_engagement": "Office USA"}))
            .unwrap();
        let result = tool.execute(args).await.unwrap();
        assert_eq!(result["group"], "Office USA");
        assert_eq!(result["engagements"].as_array().unwrap().len(), 4);
    }
}
