//! Capability-gated tool dispatch
//!
//! The composition point between the scope resolver and the tool registry:
//! a call is looked up by name, checked against the granted scope set,
//! structurally validated, and only then handed to the Gmail client.
//! An unknown tool and an unauthorized tool are distinct rejections; the
//! first means the request is wrong, the second that the grant is.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::McpError;
use crate::gmail::client::GmailClient;
use crate::gmail::filters::FilterTemplates;
use crate::gmail::message::{decode_base64url, format_size, EmailParams, MimeType};
use crate::gmail::types::{FilterAction, FilterCriteria, SizeComparison, UpdateLabelRequest};
use crate::mcp::registry::{Registry, ToolDescriptor};
use crate::mcp::types::{CallToolResult, Tool};
use crate::scopes;

/// Tool dispatcher
pub struct Dispatcher {
    /// The tool catalogue
    registry: Registry,

    /// Scopes granted to this process, short names or URLs
    granted_scopes: Vec<String>,

    /// Gmail client invoked once a call clears the gate
    client: Arc<GmailClient>,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(registry: Registry, granted_scopes: Vec<String>, client: Arc<GmailClient>) -> Self {
        Self {
            registry,
            granted_scopes,
            client,
        }
    }

    /// The published tool list
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.to_external_form()
    }

    /// Check the granted scope set against a descriptor's accepted scopes
    pub fn authorize(&self, descriptor: &ToolDescriptor) -> Result<(), McpError> {
        if scopes::is_authorized(&self.granted_scopes, descriptor.scopes) {
            return Ok(());
        }

        Err(McpError::UnauthorizedTool {
            name: descriptor.name.to_string(),
            accepted: descriptor
                .scopes
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Look up, authorize, and validate a call, then run the tool
    pub async fn dispatch(&self, name: &str, args: Value) -> CallToolResult {
        let descriptor = match self.registry.by_name(name) {
            Some(d) => d,
            None => {
                return CallToolResult::error(
                    McpError::UnknownTool {
                        name: name.to_string(),
                    }
                    .to_string(),
                )
            }
        };

        if let Err(rejection) = self.authorize(descriptor) {
            tracing::warn!("rejected tool call: {}", rejection);
            return CallToolResult::error(rejection.to_string());
        }

        if let Err(message) = descriptor.check_args(&args) {
            return CallToolResult::error(
                McpError::InvalidArguments { message }.to_string(),
            );
        }

        self.invoke(name, args).await
    }

    async fn invoke(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "read_email" => self.handle_read_email(args).await,
            "search_emails" => self.handle_search_emails(args).await,
            "download_attachment" => self.handle_download_attachment(args).await,
            "send_email" => self.handle_send_email(args, false).await,
            "draft_email" => self.handle_send_email(args, true).await,
            "modify_email" => self.handle_modify_email(args).await,
            "delete_email" => self.handle_delete_email(args).await,
            "batch_modify_emails" => self.handle_batch_modify(args).await,
            "batch_delete_emails" => self.handle_batch_delete(args).await,
            "list_email_labels" => self.handle_list_labels().await,
            "create_label" => self.handle_create_label(args).await,
            "update_label" => self.handle_update_label(args).await,
            "delete_label" => self.handle_delete_label(args).await,
            "get_or_create_label" => self.handle_get_or_create_label(args).await,
            "list_filters" => self.handle_list_filters().await,
            "get_filter" => self.handle_get_filter(args).await,
            "create_filter" => self.handle_create_filter(args).await,
            "delete_filter" => self.handle_delete_filter(args).await,
            "create_filter_from_template" => self.handle_create_filter_template(args).await,
            _ => CallToolResult::error(
                McpError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            ),
        }
    }

    // ==================== Read Handlers ====================

    async fn handle_read_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.read_message(&args.message_id).await {
            Ok(result) => {
                let mut text = format!(
                    "Thread ID: {}\nSubject: {}\nFrom: {}\nTo: {}\nDate: {}\n\n",
                    result.thread_id, result.subject, result.from, result.to, result.date
                );

                if result.is_html_only {
                    text.push_str(
                        "[Note: This email is HTML-formatted. Plain text version not available.]\n\n",
                    );
                }

                text.push_str(&result.body);

                if !result.attachments.is_empty() {
                    text.push_str(&format!("\n\nAttachments ({}):\n", result.attachments.len()));
                    for a in &result.attachments {
                        text.push_str(&format!(
                            "- {} ({}, {}, ID: {})\n",
                            a.filename,
                            a.mime_type,
                            format_size(a.size),
                            a.id
                        ));
                    }
                }

                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_search_emails(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            query: String,
            max_results: Option<u32>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.search_messages(&args.query, args.max_results).await {
            Ok(results) => {
                let text = results
                    .iter()
                    .map(|r| {
                        format!(
                            "ID: {}\nSubject: {}\nFrom: {}\nDate: {}\n",
                            r.id, r.subject, r.from, r.date
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");

                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_download_attachment(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            attachment_id: String,
            filename: Option<String>,
            save_path: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let attachment = match self
            .client
            .get_attachment(&args.message_id, &args.attachment_id)
            .await
        {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(e.to_string()),
        };

        let data = match decode_base64url(&attachment.data) {
            Ok(d) => d,
            Err(e) => return CallToolResult::error(format!("Failed to decode attachment: {}", e)),
        };

        let filename = args
            .filename
            .unwrap_or_else(|| format!("attachment-{}", args.attachment_id));
        let save_dir = args.save_path.unwrap_or_else(|| ".".to_string());
        let full_path = std::path::Path::new(&save_dir).join(&filename);

        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return CallToolResult::error(format!("Failed to create directory: {}", e));
                }
            }
        }

        if let Err(e) = std::fs::write(&full_path, &data) {
            return CallToolResult::error(format!("Failed to write file: {}", e));
        }

        CallToolResult::text(format!(
            "Attachment downloaded successfully:\nFile: {}\nSize: {} bytes\nSaved to: {}",
            filename,
            data.len(),
            full_path.display()
        ))
    }

    // ==================== Write Handlers ====================

    async fn handle_send_email(&self, args: Value, draft: bool) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            to: Vec<String>,
            subject: String,
            body: String,
            html_body: Option<String>,
            mime_type: Option<String>,
            cc: Option<Vec<String>>,
            bcc: Option<Vec<String>>,
            thread_id: Option<String>,
            in_reply_to: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let mime_type = match args.mime_type.as_deref() {
            Some("text/html") => Some(MimeType::TextHtml),
            Some("multipart/alternative") => Some(MimeType::MultipartAlternative),
            _ => None,
        };

        let params = EmailParams {
            to: args.to,
            subject: args.subject,
            body: args.body,
            html_body: args.html_body,
            mime_type,
            cc: args.cc,
            bcc: args.bcc,
            thread_id: args.thread_id,
            in_reply_to: args.in_reply_to,
        };

        if draft {
            match self.client.create_draft(params).await {
                Ok(d) => CallToolResult::text(format!(
                    "Email draft created successfully with ID: {}",
                    d.id
                )),
                Err(e) => CallToolResult::error(e.to_string()),
            }
        } else {
            match self.client.send_email(params).await {
                Ok(m) => CallToolResult::text(format!("Email sent successfully with ID: {}", m.id)),
                Err(e) => CallToolResult::error(e.to_string()),
            }
        }
    }

    async fn handle_modify_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .client
            .modify_message(&args.message_id, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(_) => CallToolResult::text(format!(
                "Email {} labels updated successfully",
                args.message_id
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_email(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.delete_message(&args.message_id).await {
            Ok(_) => {
                CallToolResult::text(format!("Email {} deleted successfully", args.message_id))
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_batch_modify(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_ids: Vec<String>,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
            batch_size: Option<usize>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .client
            .batch_modify_messages(
                &args.message_ids,
                args.add_label_ids,
                args.remove_label_ids,
                args.batch_size
                    .unwrap_or(crate::config::gmail::DEFAULT_BATCH_SIZE),
            )
            .await
        {
            Ok(result) => CallToolResult::text(format_batch_outcome(
                "Batch label modification complete.",
                "processed",
                &result,
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_batch_delete(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_ids: Vec<String>,
            batch_size: Option<usize>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .client
            .batch_delete_messages(
                &args.message_ids,
                args.batch_size
                    .unwrap_or(crate::config::gmail::DEFAULT_BATCH_SIZE),
            )
            .await
        {
            Ok(result) => CallToolResult::text(format_batch_outcome(
                "Batch delete operation complete.",
                "deleted",
                &result,
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Label Handlers ====================

    async fn handle_list_labels(&self) -> CallToolResult {
        match self.client.list_labels().await {
            Ok(result) => {
                let mut text = format!(
                    "Found {} labels ({} system, {} user):\n\n",
                    result.count.total, result.count.system, result.count.user
                );

                text.push_str("System Labels:\n");
                for label in &result.system {
                    text.push_str(&format!("ID: {}\nName: {}\n\n", label.id, label.name));
                }

                text.push_str("\nUser Labels:\n");
                for label in &result.user {
                    text.push_str(&format!("ID: {}\nName: {}\n\n", label.id, label.name));
                }

                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_create_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            name: String,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .client
            .create_label(
                &args.name,
                args.message_list_visibility.as_deref(),
                args.label_list_visibility.as_deref(),
            )
            .await
        {
            Ok(label) => CallToolResult::text(format!(
                "Label created successfully:\nID: {}\nName: {}\nType: {}",
                label.id,
                label.name,
                label.label_type.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_update_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            #[serde(alias = "labelId")]
            id: String,
            name: Option<String>,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let updates = UpdateLabelRequest {
            name: args.name,
            message_list_visibility: args.message_list_visibility,
            label_list_visibility: args.label_list_visibility,
        };

        match self.client.update_label(&args.id, updates).await {
            Ok(label) => CallToolResult::text(format!(
                "Label updated successfully:\nID: {}\nName: {}\nType: {}",
                label.id,
                label.name,
                label.label_type.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(alias = "labelId")]
            id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.delete_label(&args.id).await {
            Ok(_) => CallToolResult::text(format!("Label {} deleted successfully", args.id)),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_get_or_create_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            name: String,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .client
            .get_or_create_label(
                &args.name,
                args.message_list_visibility.as_deref(),
                args.label_list_visibility.as_deref(),
            )
            .await
        {
            Ok(label) => CallToolResult::text(format!(
                "Label:\nID: {}\nName: {}\nType: {}",
                label.id,
                label.name,
                label.label_type.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    // ==================== Filter Handlers ====================

    async fn handle_list_filters(&self) -> CallToolResult {
        match self.client.list_filters().await {
            Ok(result) => {
                if result.filters.is_empty() {
                    return CallToolResult::text("No filters found.");
                }

                let mut text = format!("Found {} filters:\n\n", result.count);
                for filter in &result.filters {
                    text.push_str(&format!("ID: {}\n", filter.id.as_deref().unwrap_or("")));
                    text.push_str(&format!(
                        "Criteria: {}\n",
                        describe_criteria(&filter.criteria)
                    ));
                    text.push_str(&format!("Actions: {}\n\n", describe_action(&filter.action)));
                }

                CallToolResult::text(text)
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_get_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            filter_id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.get_filter(&args.filter_id).await {
            Ok(filter) => CallToolResult::text(format!(
                "Filter details:\nID: {}\nCriteria: {}\nActions: {}\n",
                filter.id.as_deref().unwrap_or(""),
                describe_criteria(&filter.criteria),
                describe_action(&filter.action)
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_create_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            criteria: CriteriaArgs,
            action: ActionArgs,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CriteriaArgs {
            from: Option<String>,
            to: Option<String>,
            subject: Option<String>,
            query: Option<String>,
            negated_query: Option<String>,
            has_attachment: Option<bool>,
            exclude_chats: Option<bool>,
            size: Option<i64>,
            size_comparison: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ActionArgs {
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
            forward: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let criteria = FilterCriteria {
            from: args.criteria.from,
            to: args.criteria.to,
            subject: args.criteria.subject,
            query: args.criteria.query,
            negated_query: args.criteria.negated_query,
            has_attachment: args.criteria.has_attachment,
            exclude_chats: args.criteria.exclude_chats,
            size: args.criteria.size,
            size_comparison: args.criteria.size_comparison.map(|s| match s.as_str() {
                "smaller" => SizeComparison::Smaller,
                "larger" => SizeComparison::Larger,
                _ => SizeComparison::Unspecified,
            }),
        };

        let action = FilterAction {
            add_label_ids: args.action.add_label_ids,
            remove_label_ids: args.action.remove_label_ids,
            forward: args.action.forward,
        };

        match self.client.create_filter(criteria, action).await {
            Ok(filter) => CallToolResult::text(format!(
                "Filter created successfully:\nID: {}",
                filter.id.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_delete_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            filter_id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self.client.delete_filter(&args.filter_id).await {
            Ok(_) => {
                CallToolResult::text(format!("Filter {} deleted successfully", args.filter_id))
            }
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_create_filter_template(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            #[serde(alias = "templateName")]
            template: String,
            sender_email: Option<String>,
            subject_text: Option<String>,
            search_text: Option<String>,
            list_identifier: Option<String>,
            size_in_bytes: Option<i64>,
            label_ids: Option<Vec<String>>,
            #[serde(alias = "labelId")]
            label_id: Option<String>,
            archive: Option<bool>,
            mark_as_read: Option<bool>,
            mark_important: Option<bool>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let label_ids = args.label_ids.or_else(|| args.label_id.map(|id| vec![id]));

        let (criteria, action) = match args.template.as_str() {
            "fromSender" => match args.sender_email {
                Some(email) => {
                    FilterTemplates::from_sender(&email, label_ids, args.archive.unwrap_or(false))
                }
                None => {
                    return CallToolResult::error("senderEmail is required for fromSender template")
                }
            },
            "withSubject" => match args.subject_text {
                Some(subject) => FilterTemplates::with_subject(
                    &subject,
                    label_ids,
                    args.mark_as_read.unwrap_or(false),
                ),
                None => {
                    return CallToolResult::error("subjectText is required for withSubject template")
                }
            },
            "withAttachments" => FilterTemplates::with_attachments(label_ids),
            "largeEmails" => match args.size_in_bytes {
                Some(size) => FilterTemplates::large_emails(size, label_ids),
                None => {
                    return CallToolResult::error("sizeInBytes is required for largeEmails template")
                }
            },
            "containingText" => match args.search_text {
                Some(text) => FilterTemplates::containing_text(
                    &text,
                    label_ids,
                    args.mark_important.unwrap_or(false),
                ),
                None => {
                    return CallToolResult::error(
                        "searchText is required for containingText template",
                    )
                }
            },
            "mailingList" => match args.list_identifier {
                Some(list) => {
                    FilterTemplates::mailing_list(&list, label_ids, args.archive.unwrap_or(true))
                }
                None => {
                    return CallToolResult::error(
                        "listIdentifier is required for mailingList template",
                    )
                }
            },
            _ => return CallToolResult::error(format!("Unknown template: {}", args.template)),
        };

        match self.client.create_filter(criteria, action).await {
            Ok(filter) => CallToolResult::text(format!(
                "Filter created from template '{}':\nID: {}",
                args.template,
                filter.id.unwrap_or_default()
            )),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }
}

fn format_batch_outcome(
    heading: &str,
    verb: &str,
    result: &crate::gmail::client::BatchOperationResult,
) -> String {
    let mut text = format!(
        "{}\nSuccessfully {}: {} messages\n",
        heading, verb, result.success_count
    );

    if result.failure_count > 0 {
        text.push_str(&format!(
            "Failed to process: {} messages\n\nFailed message IDs:\n",
            result.failure_count
        ));
        for (id, err) in &result.failures {
            text.push_str(&format!("- {}... ({})\n", &id[..16.min(id.len())], err));
        }
    }

    text
}

fn describe_criteria(criteria: &FilterCriteria) -> String {
    let parts: Vec<String> = [
        criteria.from.as_ref().map(|v| format!("from: {}", v)),
        criteria.to.as_ref().map(|v| format!("to: {}", v)),
        criteria.subject.as_ref().map(|v| format!("subject: {}", v)),
        criteria.query.as_ref().map(|v| format!("query: {}", v)),
        criteria
            .has_attachment
            .map(|v| format!("hasAttachment: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();

    parts.join(", ")
}

fn describe_action(action: &FilterAction) -> String {
    let parts: Vec<String> = [
        action
            .add_label_ids
            .as_ref()
            .map(|v| format!("addLabelIds: {}", v.join(", "))),
        action
            .remove_label_ids
            .as_ref()
            .map(|v| format!("removeLabelIds: {}", v.join(", "))),
        action.forward.as_ref().map(|v| format!("forward: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher(granted: &[&str]) -> Dispatcher {
        Dispatcher::new(
            Registry::new().unwrap(),
            granted.iter().map(|s| s.to_string()).collect(),
            Arc::new(GmailClient::new("test-token".to_string())),
        )
    }

    #[tokio::test]
    async fn test_readonly_scope_cannot_delete() {
        let dispatcher = dispatcher(&["gmail.readonly"]);
        let result = dispatcher
            .dispatch("delete_email", json!({"messageId": "abc"}))
            .await;

        assert!(result.is_error);
        assert!(result.text_content().contains("not authorized"));
        assert!(result.text_content().contains("gmail.modify"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_an_authorization_failure() {
        let dispatcher = dispatcher(&["gmail.modify"]);
        let result = dispatcher.dispatch("no_such_tool", json!({})).await;

        assert!(result.is_error);
        assert!(result.text_content().contains("Unknown tool"));
        assert!(!result.text_content().contains("not authorized"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_invocation() {
        let dispatcher = dispatcher(&["gmail.modify"]);
        let result = dispatcher.dispatch("delete_email", json!({})).await;

        assert!(result.is_error);
        assert!(result.text_content().contains("messageId"));
    }

    #[tokio::test]
    async fn test_scope_url_form_authorizes() {
        let dispatcher = dispatcher(&["https://www.googleapis.com/auth/gmail.modify"]);
        let descriptor = dispatcher.registry.by_name("delete_email").unwrap();
        assert!(dispatcher.authorize(descriptor).is_ok());
    }

    #[tokio::test]
    async fn test_no_scopes_rejects_everything() {
        let dispatcher = dispatcher(&[]);
        for tool in dispatcher.registry.all() {
            assert!(dispatcher.authorize(tool).is_err(), "{} slipped the gate", tool.name);
        }
    }

    #[test]
    fn test_default_scopes_cover_the_whole_catalogue() {
        let dispatcher = dispatcher(&["gmail.modify", "gmail.settings.basic"]);
        for tool in dispatcher.registry.all() {
            assert!(
                dispatcher.authorize(tool).is_ok(),
                "{} not granted by the default scope set",
                tool.name
            );
        }
    }

    #[test]
    fn test_send_scope_grants_send_only() {
        let dispatcher = dispatcher(&["gmail.send"]);

        let send = dispatcher.registry.by_name("send_email").unwrap();
        assert!(dispatcher.authorize(send).is_ok());

        let draft = dispatcher.registry.by_name("draft_email").unwrap();
        assert!(dispatcher.authorize(draft).is_err());

        let read = dispatcher.registry.by_name("read_email").unwrap();
        assert!(dispatcher.authorize(read).is_err());
    }

    #[test]
    fn test_list_tools_matches_registry() {
        let dispatcher = dispatcher(&[]);
        // Discovery is not gated; execution is
        assert_eq!(dispatcher.list_tools().len(), 19);
    }
}
