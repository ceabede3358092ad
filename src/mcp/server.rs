//! MCP server implementation
//!
//! Runs the Model Context Protocol over stdio: line-delimited JSON-RPC on
//! stdin/stdout. Logging goes to stderr; stdout carries only protocol
//! frames.

use std::io::{BufRead, Write};

use serde_json::Value;

use crate::error::Result;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::types::*;

const SERVER_NAME: &str = "gmail";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server for the scoped Gmail tool catalogue
pub struct McpServer {
    /// Capability-gated dispatcher
    dispatcher: Dispatcher,

    /// Whether the client has completed initialization
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            initialized: false,
        }
    }

    /// Run the server on stdio
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let response_str = serde_json::to_string(&response)?;
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    async fn handle_message(&mut self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        if request.method == methods::INITIALIZED {
            self.initialized = true;
            return Ok(None);
        }

        let id = request.id.clone().unwrap_or(RequestId::Number(0));

        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = self.handle_initialize()?;
                Ok(Some(JsonRpcResponse::success(id, result)))
            }
            methods::PING => Ok(Some(JsonRpcResponse::success(id, serde_json::json!({})))),
            methods::LIST_TOOLS => {
                let result = self.handle_list_tools()?;
                Ok(Some(JsonRpcResponse::success(id, result)))
            }
            methods::CALL_TOOL => {
                let result = self.handle_call_tool(&request).await;
                Ok(Some(JsonRpcResponse::success(id, result)))
            }
            _ => Ok(Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&request.method),
            ))),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.dispatcher.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Value {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return serde_json::to_value(CallToolResult::error(format!(
                        "Invalid tool parameters: {}",
                        e
                    )))
                    .unwrap_or_default();
                }
            },
            None => {
                return serde_json::to_value(CallToolResult::error("Missing tool parameters"))
                    .unwrap_or_default();
            }
        };

        let result = self.dispatcher.dispatch(&params.name, params.arguments).await;
        serde_json::to_value(result).unwrap_or_else(|e| {
            serde_json::to_value(CallToolResult::error(e.to_string())).unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::client::GmailClient;
    use crate::mcp::registry::Registry;
    use std::sync::Arc;

    fn server(granted: &[&str]) -> McpServer {
        let dispatcher = Dispatcher::new(
            Registry::new().unwrap(),
            granted.iter().map(|s| s.to_string()).collect(),
            Arc::new(GmailClient::new("test-token".to_string())),
        );
        McpServer::new(dispatcher)
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mut server = server(&["gmail.modify"]);
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap()
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let mut server = server(&["gmail.modify"]);
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(response.is_none());
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_list_tools_lists_whole_catalogue() {
        let mut server = server(&[]);
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap()
            .unwrap();

        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 19);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server(&[]);
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"bogus"}"#)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_call_tool_rejection_flows_through() {
        let mut server = server(&["gmail.readonly"]);
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"delete_email","arguments":{"messageId":"abc"}}}"#,
            )
            .await
            .unwrap()
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not authorized"));
    }
}
