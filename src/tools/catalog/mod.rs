//! Built-in capability catalogs
//!
//! Each catalog is a small set of deterministic lookup tools over static
//! in-memory tables. A catalog can be served in-process or behind the
//! `conductor provider <catalog>` stdio server.

mod engagement;
mod it_staff;
mod service_desk;
mod team;

pub use engagement::GetComponentEngagementsTool;
pub use it_staff::{GetAvailableStaffTool, GetOnCallRotationTool, GetStaffByLocationTool};
pub use service_desk::{GetActiveTicketsTool, GetSystemStatusTool};
pub use team::GetTeamMembersTool;

use super::{Tool, ToolRegistry};
use crate::core::ToolError;
use std::sync::Arc;

/// Names of all built-in catalogs
pub const CATALOG_NAMES: &[&str] = &["engagement", "team_management", "it_staff", "service_desk"];

/// Build the registry for a named catalog
pub fn registry(name: &str) -> Option<Result<ToolRegistry, ToolError>> {
    let tools: Vec<Arc<dyn Tool>> = match name {
        "engagement" => vec![Arc::new(GetComponentEngagementsTool)],
        "team_management" => vec![Arc::new(GetTeamMembersTool)],
        "it_staff" => vec![
            Arc::new(GetAvailableStaffTool),
            Arc::new(GetOnCallRotationTool),
            Arc::new(GetStaffByLocationTool),
        ],
        "service_desk" => vec![Arc::new(GetActiveTicketsTool), Arc::new(GetSystemStatusTool)],
        _ => return None,
    };
    Some(ToolRegistry::from_tools(tools))
}

/// Display name of a catalog's server, reported during the MCP handshake
pub fn server_name(catalog: &str) -> String {
    match catalog {
        "engagement" => "Engagement MCP".to_string(),
        "team_management" => "Team Management MCP".to_string(),
        "it_staff" => "IT Staff Management MCP".to_string(),
        "service_desk" => "Service Desk MCP".to_string(),
        other => format!("{} MCP", other),
    }
}

/// Case-insensitive equality used by every catalog filter
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
