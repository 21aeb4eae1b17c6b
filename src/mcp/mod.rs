//! MCP (Model Context Protocol) over stdio.
//!
//! Capability providers that live in another process are reached through
//! this module: a client transport that spawns the process, and the server
//! loop that the `conductor provider <catalog>` subcommand runs.

pub mod server;
pub mod transport;
pub mod types;

pub use server::McpServer;
pub use transport::{expand_env_vars, StdioTransport, TransportError};
pub use types::{JsonRpcError, McpContent, McpToolDef, McpToolResult};
