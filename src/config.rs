//! Configuration management for the scoped Gmail MCP server
//!
//! Handles paths, environment variables, and the granted scope set.

use std::path::PathBuf;

use crate::error::{ConfigError, Result, ScopedMcpError};
use crate::scopes;

/// Environment variable carrying the bearer token for the Gmail API.
const ACCESS_TOKEN_VAR: &str = "GMAIL_ACCESS_TOKEN";

/// Environment variable carrying the granted scope list.
const SCOPES_VAR: &str = "GMAIL_SCOPES";

/// Configuration for the server
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for configuration files
    pub config_dir: PathBuf,

    /// Path to the provisioned access token file
    pub token_path: PathBuf,

    /// Scopes granted to this process, as short names or URLs
    pub granted_scopes: Vec<String>,
}

impl Config {
    /// Create a configuration, resolving the granted scope set.
    ///
    /// Precedence: explicit CLI input, then the GMAIL_SCOPES environment
    /// variable, then the default set. The default applies only when no
    /// scope list was given at all; an explicitly blank list parses to an
    /// empty grant and every tool call is then rejected. Unknown names are
    /// kept as opaque non-matching scopes; the caller decides whether to
    /// report them.
    pub fn new(cli_scopes: Option<&str>) -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let token_path = config_dir.join("access-token");

        let raw_scopes = cli_scopes
            .map(str::to_string)
            .or_else(|| std::env::var(SCOPES_VAR).ok());

        let granted_scopes = match raw_scopes {
            Some(input) => scopes::parse(&input),
            None => Self::default_scopes(),
        };

        Ok(Self {
            config_dir,
            token_path,
            granted_scopes,
        })
    }

    /// The scope set assumed when a caller specifies none.
    pub fn default_scopes() -> Vec<String> {
        vec!["gmail.modify".to_string(), "gmail.settings.basic".to_string()]
    }

    /// Get the configuration directory, creating it if necessary
    fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| {
                ScopedMcpError::Config(ConfigError::DirNotFound {
                    path: "~".to_string(),
                })
            })?
            .join(".gmail-scoped-mcp");

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|_| {
                ScopedMcpError::Config(ConfigError::DirCreationFailed {
                    path: config_dir.display().to_string(),
                })
            })?;
        }

        Ok(config_dir)
    }

    /// Resolve the Gmail API access token.
    ///
    /// The token is provisioned externally: either through the environment
    /// or as a file under the config directory. No acquisition or refresh
    /// happens here.
    pub fn access_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        if self.token_path.exists() {
            let token = std::fs::read_to_string(&self.token_path)?;
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        Err(ScopedMcpError::Config(ConfigError::MissingAccessToken {
            path: self.token_path.display().to_string(),
        }))
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// Default chunk size for batch operations
    pub const DEFAULT_BATCH_SIZE: usize = 50;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scopes() {
        let defaults = Config::default_scopes();
        assert_eq!(
            defaults,
            vec!["gmail.modify".to_string(), "gmail.settings.basic".to_string()]
        );
    }

    #[test]
    fn test_explicit_scopes_override_default() {
        let config = Config::new(Some("gmail.readonly")).unwrap();
        assert_eq!(config.granted_scopes, vec!["gmail.readonly".to_string()]);
    }

    #[test]
    fn test_blank_scope_input_grants_nothing() {
        let config = Config::new(Some("  ,\n ")).unwrap();
        assert!(config.granted_scopes.is_empty());
    }

    #[test]
    fn test_mixed_form_scopes_kept_verbatim() {
        let config =
            Config::new(Some("gmail.readonly https://www.googleapis.com/auth/gmail.labels"))
                .unwrap();
        assert_eq!(config.granted_scopes.len(), 2);
        assert_eq!(config.granted_scopes[0], "gmail.readonly");
        assert_eq!(
            config.granted_scopes[1],
            "https://www.googleapis.com/auth/gmail.labels"
        );
    }
}
