//! Team management catalog: members of a group engagement.

use crate::tools::{ParamSpec, ParamType, Tool, ToolSchema, ValidatedArgs};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

const TEAM_MEMBERS: &[&str] = &["Dhilip", "John", "Alice", "Bob", "Charlie", "David", "Eve"];

pub struct GetTeamMembersTool;

#[async_trait]
impl Tool for GetTeamMembersTool {
    fn name(&self) -> &str {
        "get_team_members"
    }

    fn description(&self) -> &str {
        "Get the team members for a specific group engagement"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(ParamSpec::required(
            "group_engagement",
            ParamType::String,
            "The name of the group to get team members for",
        ))
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let group = args.require_str("group_engagement")?;
        tracing::info!(group = %group, "Getting team members");
        Ok(json!({
            "group": group,
            "members": TEAM_MEMBERS,
        }))
    }
}
