//! IT staff catalog: availability, on-call rotation and staff locations.

use super::eq_ignore_case;
use crate::tools::{ParamSpec, ParamType, Tool, ToolSchema, ValidatedArgs};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct StaffMember {
    pub name: &'static str,
    pub specialty: &'static str,
    pub status: &'static str,
    pub location: &'static str,
}

impl StaffMember {
    /// Available or on call
    fn is_reachable(&self) -> bool {
        eq_ignore_case(self.status, "available") || eq_ignore_case(self.status, "on call")
    }
}

static STAFF: Lazy<Vec<StaffMember>> = Lazy::new(|| {
    let row = |name, specialty, status, location| StaffMember {
        name,
        specialty,
        status,
        location,
    };
    vec![
        row("Alice Chen", "Network", "Available", "US East"),
        row("Bob Smith", "Security", "Available", "US West"),
        row("Charlie Kumar", "DevOps", "On Call", "India"),
        row("Diana Lopez", "Database", "Available", "US East"),
        row("Ethan Park", "Network", "On Call", "US West"),
        row("Fiona Williams", "Security", "Off Duty", "US East"),
        row("George Thompson", "Database", "Off Duty", "US West"),
        row("Hannah Lee", "Email", "Available", "US East"),
        row("Ian Rodriguez", "VPN", "Available", "India"),
    ]
});

const SPECIALTIES: &[&str] = &["Network", "Security", "DevOps", "Database", "Email", "VPN"];
const LOCATIONS: &[&str] = &["US East", "US West", "India"];

pub struct GetAvailableStaffTool;

#[async_trait]
impl Tool for GetAvailableStaffTool {
    fn name(&self) -> &str {
        "get_available_staff"
    }

    fn description(&self) -> &str {
        "Get currently available IT staff, optionally filtered by specialty"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(
            ParamSpec::optional(
                "specialty",
                ParamType::String,
                "Filter by technical specialty (Network, Security, DevOps, etc.)",
            )
            .with_examples(SPECIALTIES),
        )
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let specialty = args.str("specialty");
        tracing::info!(specialty = specialty.unwrap_or("Any"), "Finding available staff");

        let staff: Vec<&StaffMember> = STAFF
            .iter()
            .filter(|p| p.is_reachable())
            .filter(|p| specialty.map_or(true, |s| eq_ignore_case(p.specialty, s)))
            .collect();
        Ok(json!(staff))
    }
}

pub struct GetOnCallRotationTool;

#[async_trait]
impl Tool for GetOnCallRotationTool {
    fn name(&self) -> &str {
        "get_on_call_rotation"
    }

    fn description(&self) -> &str {
        "Get the current and upcoming on-call rotation schedule"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
    }

    async fn execute(&self, _args: ValidatedArgs) -> Result<Value> {
        tracing::info!("Retrieving on-call rotation schedule");
        Ok(json!({
            "current": {
                "primary": "Charlie Kumar (DevOps)",
                "secondary": "Ethan Park (Network)",
                "period": "May 15-21, 2023"
            },
            "upcoming": [
                {
                    "primary": "Fiona Williams (Security)",
                    "secondary": "Alice Chen (Network)",
                    "period": "May 22-28, 2023"
                },
                {
                    "primary": "Bob Smith (Security)",
                    "secondary": "George Thompson (Database)",
                    "period": "May 29-June 4, 2023"
                }
            ]
        }))
    }
}

pub struct GetStaffByLocationTool;

#[async_trait]
impl Tool for GetStaffByLocationTool {
    fn name(&self) -> &str {
        "get_staff_by_location"
    }

    fn description(&self) -> &str {
        "Get IT staff filtered by their location"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(
            ParamSpec::required(
                "location",
                ParamType::String,
                "Location to filter by (US East, US West, India, etc.)",
            )
            .with_examples(LOCATIONS),
        )
    }

    async fn execute(&self, args: ValidatedArgs) -> Result<Value> {
        let location = args.require_str("location")?;
        tracing::info!(location = %location, "Finding staff at location");

        let staff: Vec<&StaffMember> = STAFF
            .iter()
            .filter(|p| eq_ignore_case(p.location, location))
            .collect();
        Ok(json!(staff))
    }
}
