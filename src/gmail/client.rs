//! Gmail API client
//!
//! Performs the actual Gmail REST calls once a tool call has cleared the
//! scope gate. The access token is provisioned externally; this client
//! neither acquires nor refreshes credentials.

use crate::config::gmail::{API_BASE_URL, USER_ID};
use crate::error::{GmailApiError, Result, ScopedMcpError};
use crate::gmail::message::{
    build_message, encode_raw_message, extract_attachments, extract_email_content, find_header,
    EmailParams,
};
use crate::gmail::types::*;

/// Gmail API client
pub struct GmailClient {
    /// HTTP client
    http: reqwest::Client,

    /// Bearer token for the Gmail API
    access_token: String,
}

impl GmailClient {
    /// Create a new Gmail client with a provisioned access token
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }

    fn messages_url() -> String {
        format!("{}/users/{}/messages", API_BASE_URL, USER_ID)
    }

    fn drafts_url() -> String {
        format!("{}/users/{}/drafts", API_BASE_URL, USER_ID)
    }

    fn labels_url() -> String {
        format!("{}/users/{}/labels", API_BASE_URL, USER_ID)
    }

    fn filters_url() -> String {
        format!("{}/users/{}/settings/filters", API_BASE_URL, USER_ID)
    }

    /// Map a non-success response to an error, with an optional typed
    /// not-found variant for 404s.
    async fn expect_success(
        response: reqwest::Response,
        context: &str,
        not_found: Option<GmailApiError>,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 404 {
            if let Some(err) = not_found {
                return Err(ScopedMcpError::Gmail(err));
            }
        }

        let text = response.text().await.unwrap_or_default();
        Err(ScopedMcpError::Gmail(GmailApiError::RequestFailed {
            message: format!("{} ({}): {}", context, status, text),
        }))
    }

    // ==================== Message Operations ====================

    /// Send an email
    pub async fn send_email(&self, params: EmailParams) -> Result<Message> {
        let raw = encode_raw_message(&build_message(&params)?);
        let request = SendMessageRequest {
            raw,
            thread_id: params.thread_id,
        };

        let response = self
            .http
            .post(format!("{}/send", Self::messages_url()))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let response = Self::expect_success(response, "Failed to send email", None).await?;
        Ok(response.json().await?)
    }

    /// Create a draft
    pub async fn create_draft(&self, params: EmailParams) -> Result<Draft> {
        let raw = encode_raw_message(&build_message(&params)?);
        let request = CreateDraftRequest {
            message: SendMessageRequest {
                raw,
                thread_id: params.thread_id,
            },
        };

        let response = self
            .http
            .post(Self::drafts_url())
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let response = Self::expect_success(response, "Failed to create draft", None).await?;
        Ok(response.json().await?)
    }

    /// Get a message by ID (full format)
    pub async fn get_message(&self, message_id: &str) -> Result<Message> {
        let response = self
            .http
            .get(format!("{}/{}", Self::messages_url(), message_id))
            .query(&[("format", "full")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to get message",
            Some(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Get a message with parsed headers, body, and attachment info
    pub async fn read_message(&self, message_id: &str) -> Result<ReadMessageResult> {
        let message = self.get_message(message_id).await?;
        let payload = message.payload.as_ref();

        let header = |name: &str| {
            payload
                .and_then(|p| find_header(p, name))
                .unwrap_or("")
                .to_string()
        };

        let content = payload.map(extract_email_content).unwrap_or_default();
        let attachments = payload.map(extract_attachments).unwrap_or_default();

        let is_html_only = content.text.is_empty() && !content.html.is_empty();
        let body = if !content.text.is_empty() {
            content.text
        } else if !content.html.is_empty() {
            content.html
        } else {
            // Body extraction came up empty, fall back to the snippet
            tracing::debug!("Email {} has no extractable body, using snippet", message_id);
            message.snippet.unwrap_or_default()
        };

        Ok(ReadMessageResult {
            id: message.id,
            thread_id: message.thread_id.unwrap_or_default(),
            subject: header("subject"),
            from: header("from"),
            to: header("to"),
            date: header("date"),
            body,
            is_html_only,
            attachments,
        })
    }

    /// Search for messages with Gmail query syntax
    pub async fn search_messages(
        &self,
        query: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<SearchMessageResult>> {
        let max = max_results.unwrap_or(10).to_string();

        let response = self
            .http
            .get(Self::messages_url())
            .query(&[("q", query), ("maxResults", max.as_str())])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(response, "Failed to search messages", None).await?;
        let list: MessageList = response.json().await?;

        let mut results = Vec::new();
        for msg_ref in list.messages {
            let response = self
                .http
                .get(format!("{}/{}", Self::messages_url(), msg_ref.id))
                .query(&[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                    ("metadataHeaders", "Date"),
                ])
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            if !response.status().is_success() {
                tracing::debug!("Skipping message {} in search results", msg_ref.id);
                continue;
            }

            let message: Message = response.json().await?;
            let payload = message.payload.as_ref();
            let header = |name: &str| {
                payload
                    .and_then(|p| find_header(p, name))
                    .unwrap_or("")
                    .to_string()
            };

            results.push(SearchMessageResult {
                id: message.id,
                thread_id: msg_ref.thread_id,
                subject: header("subject"),
                from: header("from"),
                date: header("date"),
            });
        }

        Ok(results)
    }

    /// Modify message labels
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<Message> {
        let request = ModifyMessageRequest {
            add_label_ids,
            remove_label_ids,
        };

        let response = self
            .http
            .post(format!("{}/{}/modify", Self::messages_url(), message_id))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to modify message",
            Some(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Delete a message by moving it to trash
    ///
    /// The gmail.modify scope cannot permanently delete, so the trash
    /// endpoint is used instead.
    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/{}/trash", Self::messages_url(), message_id))
            .bearer_auth(&self.access_token)
            .header("Content-Length", "0")
            .send()
            .await?;

        Self::expect_success(
            response,
            "Failed to trash message",
            Some(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }),
        )
        .await?;
        Ok(())
    }

    /// Fetch attachment data
    pub async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentData> {
        let response = self
            .http
            .get(format!(
                "{}/{}/attachments/{}",
                Self::messages_url(),
                message_id,
                attachment_id
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to get attachment",
            Some(GmailApiError::AttachmentNotFound {
                attachment_id: attachment_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    // ==================== Batch Operations ====================

    /// Modify labels on many messages, one batchModify call per chunk
    pub async fn batch_modify_messages(
        &self,
        message_ids: &[String],
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
        batch_size: usize,
    ) -> Result<BatchOperationResult> {
        let mut success_count = 0;
        let mut failures = Vec::new();

        for chunk in message_ids.chunks(batch_size.max(1)) {
            let request = BatchModifyRequest {
                ids: chunk.to_vec(),
                add_label_ids: add_label_ids.clone(),
                remove_label_ids: remove_label_ids.clone(),
            };

            let response = self
                .http
                .post(format!("{}/batchModify", Self::messages_url()))
                .bearer_auth(&self.access_token)
                .json(&request)
                .send()
                .await?;

            match Self::expect_success(response, "Failed to batch-modify messages", None).await {
                Ok(_) => success_count += chunk.len(),
                Err(e) => {
                    let message = e.to_string();
                    failures.extend(chunk.iter().map(|id| (id.clone(), message.clone())));
                }
            }
        }

        Ok(BatchOperationResult {
            success_count,
            failure_count: failures.len(),
            failures,
        })
    }

    /// Trash many messages, chunked, recording per-message failures
    pub async fn batch_delete_messages(
        &self,
        message_ids: &[String],
        batch_size: usize,
    ) -> Result<BatchOperationResult> {
        let mut success_count = 0;
        let mut failures = Vec::new();

        for chunk in message_ids.chunks(batch_size.max(1)) {
            for message_id in chunk {
                match self.delete_message(message_id).await {
                    Ok(_) => success_count += 1,
                    Err(e) => failures.push((message_id.clone(), e.to_string())),
                }
            }
        }

        Ok(BatchOperationResult {
            success_count,
            failure_count: failures.len(),
            failures,
        })
    }

    // ==================== Label Operations ====================

    /// List all labels, grouped by type
    pub async fn list_labels(&self) -> Result<LabelListResult> {
        let response = self
            .http
            .get(Self::labels_url())
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(response, "Failed to list labels", None).await?;
        let list: LabelList = response.json().await?;

        let (system, user): (Vec<Label>, Vec<Label>) = list
            .labels
            .into_iter()
            .partition(|l| l.label_type.as_deref() == Some("system"));

        Ok(LabelListResult {
            count: LabelCount {
                total: system.len() + user.len(),
                system: system.len(),
                user: user.len(),
            },
            system,
            user,
        })
    }

    /// Get a specific label by ID
    pub async fn get_label(&self, label_id: &str) -> Result<Label> {
        let response = self
            .http
            .get(format!("{}/{}", Self::labels_url(), label_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to get label",
            Some(GmailApiError::LabelNotFound {
                label_id: label_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Create a new label
    pub async fn create_label(
        &self,
        name: &str,
        message_list_visibility: Option<&str>,
        label_list_visibility: Option<&str>,
    ) -> Result<Label> {
        let request = CreateLabelRequest {
            name: name.to_string(),
            message_list_visibility: message_list_visibility.map(str::to_string),
            label_list_visibility: label_list_visibility.map(str::to_string),
        };

        let response = self
            .http
            .post(Self::labels_url())
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        if text.contains("already exists") {
            return Err(ScopedMcpError::Gmail(GmailApiError::LabelAlreadyExists {
                name: name.to_string(),
            }));
        }

        Err(ScopedMcpError::Gmail(GmailApiError::RequestFailed {
            message: format!("Failed to create label ({}): {}", status, text),
        }))
    }

    /// Update an existing label
    pub async fn update_label(&self, label_id: &str, updates: UpdateLabelRequest) -> Result<Label> {
        // Surface a typed not-found before attempting the update
        self.get_label(label_id).await?;

        let response = self
            .http
            .put(format!("{}/{}", Self::labels_url(), label_id))
            .bearer_auth(&self.access_token)
            .json(&updates)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to update label",
            Some(GmailApiError::LabelNotFound {
                label_id: label_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Delete a label; system labels are refused
    pub async fn delete_label(&self, label_id: &str) -> Result<()> {
        let label = self.get_label(label_id).await?;

        if label.label_type.as_deref() == Some("system") {
            return Err(ScopedMcpError::Gmail(GmailApiError::CannotDeleteSystemLabel {
                label_id: label_id.to_string(),
            }));
        }

        let response = self
            .http
            .delete(format!("{}/{}", Self::labels_url(), label_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::expect_success(
            response,
            "Failed to delete label",
            Some(GmailApiError::LabelNotFound {
                label_id: label_id.to_string(),
            }),
        )
        .await?;
        Ok(())
    }

    /// Find a label by name (case-insensitive)
    pub async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>> {
        let result = self.list_labels().await?;
        let name_lower = name.to_lowercase();

        Ok(result
            .system
            .into_iter()
            .chain(result.user)
            .find(|l| l.name.to_lowercase() == name_lower))
    }

    /// Get a label by name, creating it if absent
    pub async fn get_or_create_label(
        &self,
        name: &str,
        message_list_visibility: Option<&str>,
        label_list_visibility: Option<&str>,
    ) -> Result<Label> {
        if let Some(label) = self.find_label_by_name(name).await? {
            return Ok(label);
        }

        self.create_label(name, message_list_visibility, label_list_visibility)
            .await
    }

    // ==================== Filter Operations ====================

    /// List all filters
    pub async fn list_filters(&self) -> Result<FilterListResult> {
        let response = self
            .http
            .get(Self::filters_url())
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(response, "Failed to list filters", None).await?;

        // The API returns an empty body or {} when no filters exist
        let text = response.text().await.unwrap_or_default();
        if text.trim().is_empty() || text.trim() == "{}" {
            return Ok(FilterListResult {
                filters: vec![],
                count: 0,
            });
        }

        let list: FilterList = serde_json::from_str(&text)?;
        Ok(FilterListResult {
            count: list.filter.len(),
            filters: list.filter,
        })
    }

    /// Get a specific filter by ID
    pub async fn get_filter(&self, filter_id: &str) -> Result<Filter> {
        let response = self
            .http
            .get(format!("{}/{}", Self::filters_url(), filter_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = Self::expect_success(
            response,
            "Failed to get filter",
            Some(GmailApiError::FilterNotFound {
                filter_id: filter_id.to_string(),
            }),
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Create a filter
    pub async fn create_filter(
        &self,
        criteria: FilterCriteria,
        action: FilterAction,
    ) -> Result<Filter> {
        let filter = Filter {
            id: None,
            criteria,
            action,
        };

        let response = self
            .http
            .post(Self::filters_url())
            .bearer_auth(&self.access_token)
            .json(&filter)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        if status.as_u16() == 400 {
            return Err(ScopedMcpError::Gmail(GmailApiError::InvalidFilterCriteria {
                message: text,
            }));
        }

        Err(ScopedMcpError::Gmail(GmailApiError::RequestFailed {
            message: format!("Failed to create filter ({}): {}", status, text),
        }))
    }

    /// Delete a filter
    pub async fn delete_filter(&self, filter_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/{}", Self::filters_url(), filter_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::expect_success(
            response,
            "Failed to delete filter",
            Some(GmailApiError::FilterNotFound {
                filter_id: filter_id.to_string(),
            }),
        )
        .await?;
        Ok(())
    }
}

/// Result of reading a message
#[derive(Debug, Clone)]
pub struct ReadMessageResult {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub body: String,
    pub is_html_only: bool,
    pub attachments: Vec<EmailAttachment>,
}

/// Result of searching messages
#[derive(Debug, Clone)]
pub struct SearchMessageResult {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub date: String,
}

/// Result of a batch operation
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<(String, String)>,
}

/// Result of listing labels
#[derive(Debug, Clone)]
pub struct LabelListResult {
    /// System labels
    pub system: Vec<Label>,

    /// User labels
    pub user: Vec<Label>,

    /// Label counts
    pub count: LabelCount,
}

/// Label count statistics
#[derive(Debug, Clone)]
pub struct LabelCount {
    pub total: usize,
    pub system: usize,
    pub user: usize,
}

/// Result of listing filters
#[derive(Debug, Clone)]
pub struct FilterListResult {
    /// All filters
    pub filters: Vec<Filter>,

    /// Filter count
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction_is_offline() {
        // Building a client must not touch the network or the token's validity
        let client = GmailClient::new("test-token".to_string());
        assert_eq!(client.access_token, "test-token");
    }

    #[test]
    fn test_endpoint_urls() {
        assert!(GmailClient::messages_url().ends_with("/users/me/messages"));
        assert!(GmailClient::filters_url().ends_with("/users/me/settings/filters"));
    }
}
