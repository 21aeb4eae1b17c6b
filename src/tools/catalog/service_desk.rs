//! Service desk catalog: active tickets and system status.

use super::eq_ignore_case;
use crate::tools::{ParamSpec, ParamType, Tool, ToolSchema, ValidatedArgs};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: &'static str,
    pub title: &'static str,
    pub priority: &'static str,
    pub status: &'static str,
    pub affected_system: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub status: &'static str,
    pub uptime: &'static str,
    pub last_incident: &'static str,
}

static TICKETS: Lazy<Vec<Ticket>> = Lazy::new(|| {
    let row = |id, title, priority, status, affected_system| Ticket {
        id,
        title,
        priority,
        status,
        affected_system,
    };
    vec![
        row("INC-001", "Network outage in US East DC", "Critical", "In Progress", "Network"),
        row("INC-002", "Email service degradation", "High", "Under Investigation", "Email"),
        row("INC-003", "VPN access issues", "Medium", "Assigned", "VPN"),
        row("REQ-001", "New laptop setup", "Low", "Pending", "Hardware"),
    ]
});

static SYSTEMS: Lazy<Vec<(&'static str, SystemStatus)>> = Lazy::new(|| {
    let status = |status, uptime, last_incident| SystemStatus {
        status,
        uptime,
        last_incident,
    };
    vec![
        ("CRM", status("Operational", "99.98%", "15 days ago")),
        ("Email", status("Degraded", "97.5%", "2 hours ago")),
        ("VPN", status("Disrupted", "85.2%", "4 hours ago")),
        ("ERP", status("Operational", "99.99%", "45 days ago")),
        ("Network", status("Critical Outage", "78.5%", "1 hour ago")),
    ]
});

pub struct GetActiveTicketsTool;

#[async_trait]
impl Tool for GetActiveTicketsTool {
    fn name(&self) -> &str {
        "get_active_tickets"
    }

    fn description(&self) -> &str {
        "Get active tickets in the service desk, optionally filtered by priority"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(
            ParamSpec::optional(
                "priority",
                ParamType::String,
                "Filter by priority (Critical, High, Medium, Low)",
            )
            .with_examples(&["Critical", "High", "Medium", "Low"]),
        )
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let priority = args.str("priority");
        tracing::info!(priority = priority.unwrap_or("All"), "Getting active tickets");

        let tickets: Vec<&Ticket> = TICKETS
            .iter()
            .filter(|t| priority.map_or(true, |p| eq_ignore_case(t.priority, p)))
            .collect();
        Ok(json!(tickets))
    }
}

pub struct GetSystemStatusTool;

#[async_trait]
impl Tool for GetSystemStatusTool {
    fn name(&self) -> &str {
        "get_system_status"
    }

    fn description(&self) -> &str {
        "Get current status of IT systems"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(
            ParamSpec::optional(
                "system_name",
                ParamType::String,
                "Name of the system to check",
            )
            .with_examples(&["CRM", "Email", "VPN", "ERP", "Network"]),
        )
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let requested = args.str("system_name");
        tracing::info!(system = requested.unwrap_or("All systems"), "Checking system status");

        let matched = requested.and_then(|name| {
            SYSTEMS
                .iter()
                .find(|(system, _)| eq_ignore_case(system, name))
        });

        // Unknown names fall back to the full table
        let mut out = Map::new();
        match matched {
            Some((system, status)) => {
                out.insert(system.to_string(), json!(status));
            }
            None => {
                for (system, status) in SYSTEMS.iter() {
                    out.insert(system.to_string(), json!(status));
                }
            }
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(tool: &dyn Tool, args: Value) -> Value {
        let args = tool.schema().validate(tool.name(), &args).unwrap();
        tool.execute(args).await.unwrap()
    }

    #[tokio::test]
    async fn test_tickets_filtered_by_priority() {
        let result = run(&GetActiveTicketsTool, json!({"priority": "CRITICAL"})).await;
        let rows = result.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "INC-001");
    }

    #[tokio::test]
    async fn test_all_tickets_without_filter() {
        let result = run(&GetActiveTicketsTool, json!({})).await;
        assert_eq!(result.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_single_system_status() {
        let result = run(&GetSystemStatusTool, json!({"system_name": "vpn"})).await;
        assert_eq!(
            result,
            json!({"VPN": {"status": "Disrupted", "uptime": "85.2%", "last_incident": "4 hours ago"}})
        );
    }

    #[tokio::test]
    async fn test_unknown_system_returns_everything() {
        let result = run(&GetSystemStatusTool, json!({"system_name": "Mainframe"})).await;
        let systems: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(systems, vec!["CRM", "Email", "VPN", "ERP", "Network"]);
    }
}
