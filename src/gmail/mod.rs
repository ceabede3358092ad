//! Gmail API module
//!
//! Types, message construction, and the REST client the dispatcher calls
//! into once a tool call is authorized.

pub mod client;
pub mod filters;
pub mod message;
pub mod types;
