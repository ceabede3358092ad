//! Declarative tool catalogue
//!
//! Each descriptor binds an operation name to its description, its input
//! schema, and the scopes that grant it. The catalogue is data: adding a
//! tool is a single record in [`catalogue`] with no code change elsewhere.
//!
//! Scope lists are maintained by hand and must enumerate every granting
//! scope, including broader scopes that subsume narrower ones (gmail.modify
//! grants everything gmail.readonly grants); the satisfaction check is a
//! plain intersection and derives nothing.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::{RegistryError, Result};
use crate::mcp::types::Tool;
use crate::scopes::Scope;

/// Scopes that grant read access to messages
const READ: &[Scope] = &[Scope::Readonly, Scope::Modify];

/// Scopes that grant sending
const SEND: &[Scope] = &[Scope::Modify, Scope::Compose, Scope::Send];

/// Scopes that grant draft creation
const DRAFT: &[Scope] = &[Scope::Modify, Scope::Compose];

/// Scopes that grant message mutation
const MODIFY: &[Scope] = &[Scope::Modify];

/// Scopes that grant label listing
const LIST_LABELS: &[Scope] = &[Scope::Readonly, Scope::Modify, Scope::Labels];

/// Scopes that grant label mutation
const MANAGE_LABELS: &[Scope] = &[Scope::Modify, Scope::Labels];

/// Scopes that grant filter management
const SETTINGS: &[Scope] = &[Scope::SettingsBasic];

/// A single tool in the catalogue
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: &'static str,

    /// Human description
    pub description: &'static str,

    /// JSON Schema for the arguments object
    pub input_schema: Value,

    /// Scopes that grant this tool; any one is sufficient
    pub scopes: &'static [Scope],
}

impl ToolDescriptor {
    /// Structural check of call arguments against the input schema.
    ///
    /// The arguments must form an object (null stands in for an empty one)
    /// carrying every required property, and properties with a declared
    /// primitive type must match it. Handlers do the full typed decode.
    pub fn check_args(&self, args: &Value) -> std::result::Result<(), String> {
        let empty = serde_json::Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err("arguments must be an object".to_string()),
        };

        let required = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for field in required.iter().filter_map(Value::as_str) {
            let value = object
                .get(field)
                .ok_or_else(|| format!("missing required field: {}", field))?;

            let declared = self
                .input_schema
                .pointer(&format!("/properties/{}/type", field))
                .and_then(Value::as_str);

            if let Some(expected) = declared {
                if !type_matches(expected, value) {
                    return Err(format!("field {} must be of type {}", field, expected));
                }
            }
        }

        Ok(())
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

/// The tool registry: an immutable catalogue built once at startup
pub struct Registry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    /// Build the registry, enforcing its construction invariants: unique
    /// tool names and a non-empty scope list per tool. A violation is a
    /// configuration error and aborts startup.
    pub fn new() -> Result<Self> {
        Self::from_descriptors(catalogue())
    }

    fn from_descriptors(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tools.len());

        for (position, tool) in tools.iter().enumerate() {
            if tool.scopes.is_empty() {
                return Err(RegistryError::NoGrantingScopes { name: tool.name }.into());
            }
            if index.insert(tool.name, position).is_some() {
                return Err(RegistryError::DuplicateTool { name: tool.name }.into());
            }
        }

        Ok(Self { tools, index })
    }

    /// The full catalogue, in its fixed categorical order: read operations,
    /// write operations, label operations, filter operations.
    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Look up a descriptor by name
    pub fn by_name(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Project the catalogue into the shape published over tools/list.
    ///
    /// Granting scopes are internal policy and are never part of the
    /// published form.
    pub fn to_external_form(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|tool| Tool {
                name: tool.name.to_string(),
                description: Some(tool.description.to_string()),
                input_schema: tool.input_schema.clone(),
            })
            .collect()
    }
}

/// The static tool catalogue
fn catalogue() -> Vec<ToolDescriptor> {
    let tool = |name, description, input_schema, scopes| ToolDescriptor {
        name,
        description,
        input_schema,
        scopes,
    };

    vec![
        // Read operations
        tool(
            "read_email",
            "Retrieves the content of a specific email",
            read_email_schema(),
            READ,
        ),
        tool(
            "search_emails",
            "Searches for emails using Gmail search syntax",
            search_emails_schema(),
            READ,
        ),
        tool(
            "download_attachment",
            "Downloads an email attachment to a specified location",
            download_attachment_schema(),
            READ,
        ),
        // Write operations
        tool("send_email", "Sends a new email", send_email_schema(), SEND),
        tool(
            "draft_email",
            "Create a new email draft",
            send_email_schema(),
            DRAFT,
        ),
        tool(
            "modify_email",
            "Modifies email labels (move to different folders)",
            modify_email_schema(),
            MODIFY,
        ),
        tool(
            "delete_email",
            "Permanently deletes an email",
            delete_email_schema(),
            MODIFY,
        ),
        tool(
            "batch_modify_emails",
            "Modifies labels for multiple emails in batches",
            batch_modify_emails_schema(),
            MODIFY,
        ),
        tool(
            "batch_delete_emails",
            "Permanently deletes multiple emails in batches",
            batch_delete_emails_schema(),
            MODIFY,
        ),
        // Label operations
        tool(
            "list_email_labels",
            "Retrieves all available Gmail labels",
            empty_schema(),
            LIST_LABELS,
        ),
        tool(
            "create_label",
            "Creates a new Gmail label",
            create_label_schema(),
            MANAGE_LABELS,
        ),
        tool(
            "update_label",
            "Updates an existing Gmail label",
            update_label_schema(),
            MANAGE_LABELS,
        ),
        tool(
            "delete_label",
            "Deletes a Gmail label",
            delete_label_schema(),
            MANAGE_LABELS,
        ),
        tool(
            "get_or_create_label",
            "Gets an existing label by name or creates it if it doesn't exist",
            get_or_create_label_schema(),
            MANAGE_LABELS,
        ),
        // Filter operations
        tool(
            "list_filters",
            "Retrieves all Gmail filters",
            empty_schema(),
            SETTINGS,
        ),
        tool(
            "get_filter",
            "Gets details of a specific Gmail filter",
            get_filter_schema(),
            SETTINGS,
        ),
        tool(
            "create_filter",
            "Creates a new Gmail filter with custom criteria and actions",
            create_filter_schema(),
            SETTINGS,
        ),
        tool(
            "delete_filter",
            "Deletes a Gmail filter",
            delete_filter_schema(),
            SETTINGS,
        ),
        tool(
            "create_filter_from_template",
            "Creates a filter using a pre-defined template for common scenarios",
            create_filter_from_template_schema(),
            SETTINGS,
        ),
    ]
}

// ==================== Schema Definitions ====================

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn send_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {"type": "array", "items": {"type": "string"}, "description": "List of recipient email addresses"},
            "subject": {"type": "string", "description": "Email subject"},
            "body": {"type": "string", "description": "Email body content"},
            "htmlBody": {"type": "string", "description": "HTML version of the email body"},
            "mimeType": {
                "type": "string",
                "enum": ["text/plain", "text/html", "multipart/alternative"],
                "description": "Email content type"
            },
            "cc": {"type": "array", "items": {"type": "string"}, "description": "List of CC recipients"},
            "bcc": {"type": "array", "items": {"type": "string"}, "description": "List of BCC recipients"},
            "threadId": {"type": "string", "description": "Thread ID to reply to"},
            "inReplyTo": {"type": "string", "description": "Message ID being replied to"}
        },
        "required": ["to", "subject", "body"]
    })
}

fn read_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email message to retrieve"}
        },
        "required": ["messageId"]
    })
}

fn search_emails_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": "Gmail search query"},
            "maxResults": {"type": "number", "description": "Maximum number of results"}
        },
        "required": ["query"]
    })
}

fn modify_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email message to modify"},
            "addLabelIds": {"type": "array", "items": {"type": "string"}, "description": "List of label IDs to add"},
            "removeLabelIds": {"type": "array", "items": {"type": "string"}, "description": "List of label IDs to remove"}
        },
        "required": ["messageId"]
    })
}

fn delete_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email message to delete"}
        },
        "required": ["messageId"]
    })
}

fn batch_modify_emails_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageIds": {"type": "array", "items": {"type": "string"}, "description": "List of message IDs to modify"},
            "addLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to add"},
            "removeLabelIds": {"type": "array", "items": {"type": "string"}, "description": "Label IDs to remove"},
            "batchSize": {"type": "number", "description": "Batch size (default: 50)"}
        },
        "required": ["messageIds"]
    })
}

fn batch_delete_emails_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageIds": {"type": "array", "items": {"type": "string"}, "description": "List of message IDs to delete"},
            "batchSize": {"type": "number", "description": "Batch size (default: 50)"}
        },
        "required": ["messageIds"]
    })
}

fn create_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Name for the new label"},
            "messageListVisibility": {"type": "string", "enum": ["show", "hide"], "description": "Message list visibility"},
            "labelListVisibility": {
                "type": "string",
                "enum": ["labelShow", "labelShowIfUnread", "labelHide"],
                "description": "Label list visibility"
            }
        },
        "required": ["name"]
    })
}

fn update_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "ID of the label to update"},
            "name": {"type": "string", "description": "New name for the label"},
            "messageListVisibility": {"type": "string", "enum": ["show", "hide"]},
            "labelListVisibility": {"type": "string", "enum": ["labelShow", "labelShowIfUnread", "labelHide"]}
        },
        "required": ["id"]
    })
}

fn delete_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "ID of the label to delete"}
        },
        "required": ["id"]
    })
}

fn get_or_create_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Name of the label"},
            "messageListVisibility": {"type": "string", "enum": ["show", "hide"]},
            "labelListVisibility": {"type": "string", "enum": ["labelShow", "labelShowIfUnread", "labelHide"]}
        },
        "required": ["name"]
    })
}

fn create_filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "criteria": {
                "type": "object",
                "properties": {
                    "from": {"type": "string"},
                    "to": {"type": "string"},
                    "subject": {"type": "string"},
                    "query": {"type": "string"},
                    "negatedQuery": {"type": "string"},
                    "hasAttachment": {"type": "boolean"},
                    "excludeChats": {"type": "boolean"},
                    "size": {"type": "number"},
                    "sizeComparison": {"type": "string", "enum": ["unspecified", "smaller", "larger"]}
                }
            },
            "action": {
                "type": "object",
                "properties": {
                    "addLabelIds": {"type": "array", "items": {"type": "string"}},
                    "removeLabelIds": {"type": "array", "items": {"type": "string"}},
                    "forward": {"type": "string"}
                }
            }
        },
        "required": ["criteria", "action"]
    })
}

fn get_filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filterId": {"type": "string", "description": "ID of the filter"}
        },
        "required": ["filterId"]
    })
}

fn delete_filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filterId": {"type": "string", "description": "ID of the filter to delete"}
        },
        "required": ["filterId"]
    })
}

fn create_filter_from_template_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "template": {
                "type": "string",
                "enum": ["fromSender", "withSubject", "withAttachments", "largeEmails", "containingText", "mailingList"],
                "description": "Pre-defined filter template"
            },
            "senderEmail": {"type": "string", "description": "Email address for fromSender template"},
            "subjectText": {"type": "string", "description": "Subject text for withSubject template"},
            "searchText": {"type": "string", "description": "Search text for containingText template"},
            "listIdentifier": {"type": "string", "description": "List ID for mailingList template"},
            "sizeInBytes": {"type": "number", "description": "Size threshold for largeEmails template"},
            "labelIds": {"type": "array", "items": {"type": "string"}, "description": "Labels to apply"},
            "archive": {"type": "boolean", "description": "Whether to archive matching emails"},
            "markAsRead": {"type": "boolean", "description": "Whether to mark matching emails as read"},
            "markImportant": {"type": "boolean", "description": "Whether to mark matching emails as important"}
        },
        "required": ["template"]
    })
}

fn download_attachment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "ID of the email containing the attachment"},
            "attachmentId": {"type": "string", "description": "ID of the attachment"},
            "filename": {"type": "string", "description": "Filename to save as"},
            "savePath": {"type": "string", "description": "Directory to save to"}
        },
        "required": ["messageId", "attachmentId"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_builds() {
        let registry = Registry::new().unwrap();
        assert_eq!(registry.all().len(), 19);
    }

    #[test]
    fn test_tool_names_unique() {
        let registry = Registry::new().unwrap();
        let names: HashSet<&str> = registry.all().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), registry.all().len());
    }

    #[test]
    fn test_every_tool_has_scopes() {
        let registry = Registry::new().unwrap();
        for tool in registry.all() {
            assert!(!tool.scopes.is_empty(), "tool {} has no scopes", tool.name);
        }
    }

    #[test]
    fn test_categorical_order() {
        let registry = Registry::new().unwrap();
        let names: Vec<&str> = registry.all().iter().map(|t| t.name).collect();
        assert_eq!(names[0], "read_email");
        assert_eq!(names[3], "send_email");
        assert_eq!(names[9], "list_email_labels");
        assert_eq!(names[18], "create_filter_from_template");
    }

    #[test]
    fn test_by_name() {
        let registry = Registry::new().unwrap();
        assert!(registry.by_name("delete_email").is_some());
        assert!(registry.by_name("no_such_tool").is_none());
    }

    #[test]
    fn test_scope_sets() {
        let registry = Registry::new().unwrap();

        let read = registry.by_name("read_email").unwrap();
        assert_eq!(read.scopes, &[Scope::Readonly, Scope::Modify]);

        let send = registry.by_name("send_email").unwrap();
        assert_eq!(send.scopes, &[Scope::Modify, Scope::Compose, Scope::Send]);

        let draft = registry.by_name("draft_email").unwrap();
        assert_eq!(draft.scopes, &[Scope::Modify, Scope::Compose]);

        let delete = registry.by_name("delete_email").unwrap();
        assert_eq!(delete.scopes, &[Scope::Modify]);

        let labels = registry.by_name("list_email_labels").unwrap();
        assert_eq!(labels.scopes, &[Scope::Readonly, Scope::Modify, Scope::Labels]);

        let filters = registry.by_name("list_filters").unwrap();
        assert_eq!(filters.scopes, &[Scope::SettingsBasic]);
    }

    #[test]
    fn test_external_form_never_exposes_scopes() {
        let registry = Registry::new().unwrap();
        for tool in registry.to_external_form() {
            let json = serde_json::to_value(&tool).unwrap();
            let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
            assert!(!keys.iter().any(|k| k.to_lowercase().contains("scope")));
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut tools = catalogue();
        let dup = tools[0].clone();
        tools.push(dup);
        assert!(Registry::from_descriptors(tools).is_err());
    }

    #[test]
    fn test_empty_scope_list_rejected() {
        let mut tools = catalogue();
        tools[0].scopes = &[];
        assert!(Registry::from_descriptors(tools).is_err());
    }

    #[test]
    fn test_check_args_missing_required() {
        let registry = Registry::new().unwrap();
        let tool = registry.by_name("read_email").unwrap();
        let err = tool.check_args(&json!({})).unwrap_err();
        assert!(err.contains("messageId"));
    }

    #[test]
    fn test_check_args_wrong_type() {
        let registry = Registry::new().unwrap();
        let tool = registry.by_name("read_email").unwrap();
        let err = tool.check_args(&json!({"messageId": 5})).unwrap_err();
        assert!(err.contains("string"));
    }

    #[test]
    fn test_check_args_accepts_valid() {
        let registry = Registry::new().unwrap();
        let tool = registry.by_name("search_emails").unwrap();
        assert!(tool.check_args(&json!({"query": "is:unread"})).is_ok());
    }

    #[test]
    fn test_check_args_null_for_no_required() {
        let registry = Registry::new().unwrap();
        let tool = registry.by_name("list_email_labels").unwrap();
        assert!(tool.check_args(&Value::Null).is_ok());
    }

    #[test]
    fn test_check_args_rejects_non_object() {
        let registry = Registry::new().unwrap();
        let tool = registry.by_name("list_filters").unwrap();
        assert!(tool.check_args(&json!("not an object")).is_err());
    }
}
