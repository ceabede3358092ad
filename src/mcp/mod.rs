//! MCP module
//!
//! The tool registry, the scope-gated dispatcher, and the JSON-RPC stdio
//! server that exposes them.

pub mod dispatch;
pub mod registry;
pub mod server;
pub mod types;
