//! Error types for the scoped Gmail MCP server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the server
#[derive(Error, Debug)]
pub enum ScopedMcpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool registry construction errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailApiError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },

    #[error("Failed to create config directory: {path}")]
    DirCreationFailed { path: String },

    #[error("No access token: set GMAIL_ACCESS_TOKEN or provision {path}")]
    MissingAccessToken { path: String },
}

/// Tool registry construction errors
///
/// These violate startup invariants and abort the process; they are never
/// produced at call time.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate tool name in registry: {name}")]
    DuplicateTool { name: &'static str },

    #[error("Tool {name} lists no granting scopes and would be unreachable")]
    NoGrantingScopes { name: &'static str },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("Message not found: {message_id}")]
    MessageNotFound { message_id: String },

    #[error("Label not found: {label_id}")]
    LabelNotFound { label_id: String },

    #[error("Label already exists: {name}")]
    LabelAlreadyExists { name: String },

    #[error("Cannot delete system label: {label_id}")]
    CannotDeleteSystemLabel { label_id: String },

    #[error("Filter not found: {filter_id}")]
    FilterNotFound { filter_id: String },

    #[error("Invalid filter criteria: {message}")]
    InvalidFilterCriteria { message: String },

    #[error("Attachment not found: {attachment_id}")]
    AttachmentNotFound { attachment_id: String },

    #[error("API request failed: {message}")]
    RequestFailed { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool '{name}' is not authorized: requires one of [{accepted}]")]
    UnauthorizedTool { name: String, accepted: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ScopedMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::UnauthorizedTool {
            name: "delete_email".to_string(),
            accepted: "gmail.modify".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("delete_email"));
        assert!(text.contains("gmail.modify"));
    }

    #[test]
    fn test_unknown_and_unauthorized_are_distinct() {
        let unknown = McpError::UnknownTool {
            name: "delete_email".to_string(),
        };
        let unauthorized = McpError::UnauthorizedTool {
            name: "delete_email".to_string(),
            accepted: "gmail.modify".to_string(),
        };
        assert_ne!(unknown.to_string(), unauthorized.to_string());
    }

    #[test]
    fn test_error_conversion() {
        let registry_err = RegistryError::DuplicateTool { name: "read_email" };
        let err: ScopedMcpError = registry_err.into();
        assert!(matches!(err, ScopedMcpError::Registry(_)));
    }
}
