//! # tacit-mcp
//!
//! MCP tool server exposing the tacit search operations over stdio.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
