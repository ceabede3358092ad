//! Scoped Gmail MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Gmail whose tool catalogue is
//! gated by OAuth2 scopes. Every tool declares the scopes that grant it;
//! a call is dispatched only when the process holds at least one of them.

pub mod config;
pub mod error;
pub mod gmail;
pub mod mcp;
pub mod scopes;

pub use config::Config;
pub use error::{Result, ScopedMcpError};
