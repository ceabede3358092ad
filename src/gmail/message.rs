//! Email message construction and content extraction
//!
//! Builds RFC 2822 messages for send/draft and pulls text, headers, and
//! attachment metadata out of Gmail MIME payloads.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{Result, ScopedMcpError, ValidationError};
use crate::gmail::types::{EmailAttachment, EmailContent, MessagePart};

/// Validate an email address
pub fn validate_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    !local.is_empty()
        && !domain.is_empty()
        && !local.contains(' ')
        && !domain.contains(' ')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Encode text for a MIME header (RFC 2047)
pub fn encode_mime_header(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '\r' && c != '\n') {
        return text.to_string();
    }

    format!(
        "=?UTF-8?B?{}?=",
        base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
    )
}

/// Encode a raw email message for the Gmail API (base64url, no padding)
pub fn encode_raw_message(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// Decode base64url data from the Gmail API
///
/// Handles both padded and non-padded base64url encoding.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(data))
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(data))
        .map_err(|e| {
            ScopedMcpError::Validation(ValidationError::InvalidParameter {
                name: "base64 data".to_string(),
                message: e.to_string(),
            })
        })
}

/// Decode base64url data to a string
pub fn decode_base64url_string(data: &str) -> Result<String> {
    let bytes = decode_base64url(data)?;
    String::from_utf8(bytes).map_err(|e| {
        ScopedMcpError::Validation(ValidationError::InvalidParameter {
            name: "UTF-8 content".to_string(),
            message: e.to_string(),
        })
    })
}

/// Human-readable size
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{} KB", ((bytes as f64) / KB as f64).round() as i64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

/// Find a header value by name (case-insensitive)
pub fn find_header<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Recursively extract email body content from MIME message parts
pub fn extract_email_content(message_part: &MessagePart) -> EmailContent {
    let mut content = EmailContent::default();

    let mime_type = message_part.mime_type.as_deref().unwrap_or("");

    if let Some(data) = message_part.body.as_ref().and_then(|b| b.data.as_ref()) {
        if mime_type.starts_with("text/") {
            match decode_base64url_string(data) {
                Ok(decoded) => {
                    if mime_type == "text/plain" {
                        content.text = decoded;
                    } else if mime_type == "text/html" {
                        content.html = decoded;
                    }
                }
                Err(e) => {
                    tracing::debug!("Failed to decode {} part: {}", mime_type, e);
                }
            }
        }
    }

    // Handles multipart/alternative, multipart/mixed, multipart/related
    for part in &message_part.parts {
        let nested = extract_email_content(part);
        if !nested.text.is_empty() {
            content.text.push_str(&nested.text);
        }
        if !nested.html.is_empty() {
            content.html.push_str(&nested.html);
        }
    }

    content
}

/// Extract attachment information from message parts
pub fn extract_attachments(message_part: &MessagePart) -> Vec<EmailAttachment> {
    let mut attachments = Vec::new();
    extract_attachments_recursive(message_part, &mut attachments);
    attachments
}

fn extract_attachments_recursive(part: &MessagePart, attachments: &mut Vec<EmailAttachment>) {
    if let Some(ref body) = part.body {
        if let Some(ref attachment_id) = body.attachment_id {
            let filename = part
                .filename
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| format!("attachment-{}", attachment_id));

            attachments.push(EmailAttachment {
                id: attachment_id.clone(),
                filename,
                mime_type: part
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                size: body.size,
            });
        }
    }

    for subpart in &part.parts {
        extract_attachments_recursive(subpart, attachments);
    }
}

/// Email content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    TextPlain,
    TextHtml,
    MultipartAlternative,
}

/// Parameters for creating an email message
#[derive(Debug, Clone)]
pub struct EmailParams {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
    pub mime_type: Option<MimeType>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub thread_id: Option<String>,
    pub in_reply_to: Option<String>,
}

fn generate_boundary() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{:08x}{:08x}", std::process::id(), nanos)
}

/// Build an RFC 2822 message from the given parameters
pub fn build_message(params: &EmailParams) -> Result<String> {
    for email in &params.to {
        if !validate_email(email) {
            return Err(ScopedMcpError::Validation(ValidationError::InvalidEmail {
                email: email.clone(),
            }));
        }
    }

    let mime_type = params.mime_type.unwrap_or(MimeType::TextPlain);
    let use_alternative = params.html_body.is_some() && mime_type != MimeType::TextPlain;

    let mut lines = Vec::new();

    lines.push("From: me".to_string());
    lines.push(format!("To: {}", params.to.join(", ")));

    if let Some(ref cc) = params.cc {
        if !cc.is_empty() {
            lines.push(format!("Cc: {}", cc.join(", ")));
        }
    }

    if let Some(ref bcc) = params.bcc {
        if !bcc.is_empty() {
            lines.push(format!("Bcc: {}", bcc.join(", ")));
        }
    }

    lines.push(format!("Subject: {}", encode_mime_header(&params.subject)));

    if let Some(ref in_reply_to) = params.in_reply_to {
        lines.push(format!("In-Reply-To: {}", in_reply_to));
        lines.push(format!("References: {}", in_reply_to));
    }

    lines.push("MIME-Version: 1.0".to_string());

    if use_alternative {
        let boundary = format!("----=_NextPart_{}", generate_boundary());
        lines.push(format!(
            "Content-Type: multipart/alternative; boundary=\"{}\"",
            boundary
        ));
        lines.push(String::new());

        lines.push(format!("--{}", boundary));
        lines.push("Content-Type: text/plain; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(params.body.clone());
        lines.push(String::new());

        lines.push(format!("--{}", boundary));
        lines.push("Content-Type: text/html; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(
            params
                .html_body
                .clone()
                .unwrap_or_else(|| params.body.clone()),
        );
        lines.push(String::new());

        lines.push(format!("--{}--", boundary));
    } else if mime_type == MimeType::TextHtml {
        lines.push("Content-Type: text/html; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(
            params
                .html_body
                .clone()
                .unwrap_or_else(|| params.body.clone()),
        );
    } else {
        lines.push("Content-Type: text/plain; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(params.body.clone());
    }

    Ok(lines.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(to: &str) -> EmailParams {
        EmailParams {
            to: vec![to.to_string()],
            subject: "Test Subject".to_string(),
            body: "Test body".to_string(),
            html_body: None,
            mime_type: None,
            cc: None,
            bcc: None,
            thread_id: None,
            in_reply_to: None,
        }
    }

    #[test]
    fn test_validate_email_addresses() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user.name@example.co.uk"));
        assert!(validate_email("user+tag@example.com"));

        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@.com"));
    }

    #[test]
    fn test_encode_mime_header_ascii() {
        assert_eq!(encode_mime_header("Hello World"), "Hello World");
    }

    #[test]
    fn test_encode_mime_header_unicode() {
        let result = encode_mime_header("Héllo Wörld 你好");
        assert!(result.starts_with("=?UTF-8?B?"));
        assert!(result.ends_with("?="));
    }

    #[test]
    fn test_base64url_roundtrip() {
        let encoded = encode_raw_message("hello");
        assert_eq!(decode_base64url(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_base64url_accepts_padding() {
        // "hi" with standard padding
        assert_eq!(decode_base64url("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "2 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }

    #[test]
    fn test_build_simple_message() {
        let result = build_message(&params("test@example.com")).unwrap();
        assert!(result.contains("To: test@example.com"));
        assert!(result.contains("Subject: Test Subject"));
        assert!(result.contains("Test body"));
        assert!(result.contains("Content-Type: text/plain"));
    }

    #[test]
    fn test_build_html_message() {
        let mut p = params("test@example.com");
        p.html_body = Some("<h1>HTML Version</h1>".to_string());
        p.mime_type = Some(MimeType::MultipartAlternative);

        let result = build_message(&p).unwrap();
        assert!(result.contains("multipart/alternative"));
        assert!(result.contains("Test body"));
        assert!(result.contains("<h1>HTML Version</h1>"));
    }

    #[test]
    fn test_build_message_with_cc_bcc() {
        let mut p = params("to@example.com");
        p.cc = Some(vec!["cc@example.com".to_string()]);
        p.bcc = Some(vec!["bcc@example.com".to_string()]);

        let result = build_message(&p).unwrap();
        assert!(result.contains("Cc: cc@example.com"));
        assert!(result.contains("Bcc: bcc@example.com"));
    }

    #[test]
    fn test_build_message_with_reply_headers() {
        let mut p = params("to@example.com");
        p.in_reply_to = Some("<original@example.com>".to_string());

        let result = build_message(&p).unwrap();
        assert!(result.contains("In-Reply-To: <original@example.com>"));
        assert!(result.contains("References: <original@example.com>"));
    }

    #[test]
    fn test_build_message_rejects_invalid_recipient() {
        assert!(build_message(&params("invalid-email")).is_err());
    }

    #[test]
    fn test_find_header_case_insensitive() {
        use crate::gmail::types::Header;
        let part = MessagePart {
            headers: vec![Header {
                name: "Subject".to_string(),
                value: "Hi".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(find_header(&part, "subject"), Some("Hi"));
        assert_eq!(find_header(&part, "from"), None);
    }

    #[test]
    fn test_extract_attachments_nested() {
        use crate::gmail::types::MessagePartBody;
        let part = MessagePart {
            parts: vec![MessagePart {
                filename: Some("doc.pdf".to_string()),
                mime_type: Some("application/pdf".to_string()),
                body: Some(MessagePartBody {
                    attachment_id: Some("att1".to_string()),
                    size: 42,
                    data: None,
                }),
                ..Default::default()
            }],
            ..Default::default()
        };

        let attachments = extract_attachments(&part);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "doc.pdf");
        assert_eq!(attachments[0].size, 42);
    }
}
