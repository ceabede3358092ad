//! Pre-defined filter templates for common scenarios

use crate::gmail::types::{FilterAction, FilterCriteria, SizeComparison};

/// Filter templates, each producing a criteria/action pair ready to create
pub struct FilterTemplates;

impl FilterTemplates {
    /// Filter emails from a specific sender
    pub fn from_sender(
        sender_email: &str,
        label_ids: Option<Vec<String>>,
        archive: bool,
    ) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            from: Some(sender_email.to_string()),
            ..Default::default()
        };

        let action = FilterAction {
            add_label_ids: label_ids,
            remove_label_ids: archive.then(|| vec!["INBOX".to_string()]),
            ..Default::default()
        };

        (criteria, action)
    }

    /// Filter emails with a specific subject
    pub fn with_subject(
        subject_text: &str,
        label_ids: Option<Vec<String>>,
        mark_as_read: bool,
    ) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            subject: Some(subject_text.to_string()),
            ..Default::default()
        };

        let action = FilterAction {
            add_label_ids: label_ids,
            remove_label_ids: mark_as_read.then(|| vec!["UNREAD".to_string()]),
            ..Default::default()
        };

        (criteria, action)
    }

    /// Filter emails with attachments
    pub fn with_attachments(label_ids: Option<Vec<String>>) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            has_attachment: Some(true),
            ..Default::default()
        };

        let action = FilterAction {
            add_label_ids: label_ids,
            ..Default::default()
        };

        (criteria, action)
    }

    /// Filter emails larger than a size threshold
    pub fn large_emails(
        size_in_bytes: i64,
        label_ids: Option<Vec<String>>,
    ) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            size: Some(size_in_bytes),
            size_comparison: Some(SizeComparison::Larger),
            ..Default::default()
        };

        let action = FilterAction {
            add_label_ids: label_ids,
            ..Default::default()
        };

        (criteria, action)
    }

    /// Filter emails containing specific text
    pub fn containing_text(
        search_text: &str,
        label_ids: Option<Vec<String>>,
        mark_important: bool,
    ) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            query: Some(format!("\"{}\"", search_text)),
            ..Default::default()
        };

        let mut add_labels = label_ids.unwrap_or_default();
        if mark_important {
            add_labels.push("IMPORTANT".to_string());
        }

        let action = FilterAction {
            add_label_ids: (!add_labels.is_empty()).then_some(add_labels),
            ..Default::default()
        };

        (criteria, action)
    }

    /// Filter mailing list emails
    pub fn mailing_list(
        list_identifier: &str,
        label_ids: Option<Vec<String>>,
        archive: bool,
    ) -> (FilterCriteria, FilterAction) {
        let criteria = FilterCriteria {
            query: Some(format!(
                "list:{} OR subject:[{}]",
                list_identifier, list_identifier
            )),
            ..Default::default()
        };

        let action = FilterAction {
            add_label_ids: label_ids,
            remove_label_ids: archive.then(|| vec!["INBOX".to_string()]),
            ..Default::default()
        };

        (criteria, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sender_template() {
        let (criteria, action) =
            FilterTemplates::from_sender("news@example.com", Some(vec!["Label_1".to_string()]), true);

        assert_eq!(criteria.from, Some("news@example.com".to_string()));
        assert_eq!(action.add_label_ids, Some(vec!["Label_1".to_string()]));
        assert_eq!(action.remove_label_ids, Some(vec!["INBOX".to_string()]));
    }

    #[test]
    fn test_with_subject_template() {
        let (criteria, action) = FilterTemplates::with_subject("[URGENT]", None, true);

        assert_eq!(criteria.subject, Some("[URGENT]".to_string()));
        assert_eq!(action.remove_label_ids, Some(vec!["UNREAD".to_string()]));
    }

    #[test]
    fn test_with_attachments_template() {
        let (criteria, _action) = FilterTemplates::with_attachments(None);
        assert_eq!(criteria.has_attachment, Some(true));
    }

    #[test]
    fn test_large_emails_template() {
        let (criteria, _action) = FilterTemplates::large_emails(5 * 1024 * 1024, None);

        assert_eq!(criteria.size, Some(5 * 1024 * 1024));
        assert_eq!(criteria.size_comparison, Some(SizeComparison::Larger));
    }

    #[test]
    fn test_containing_text_template() {
        let (criteria, action) = FilterTemplates::containing_text("confidential", None, true);

        assert!(criteria.query.as_ref().unwrap().contains("confidential"));
        assert_eq!(action.add_label_ids, Some(vec!["IMPORTANT".to_string()]));
    }

    #[test]
    fn test_mailing_list_template() {
        let (criteria, action) = FilterTemplates::mailing_list("rust-users", None, true);

        assert!(criteria.query.as_ref().unwrap().contains("list:rust-users"));
        assert_eq!(action.remove_label_ids, Some(vec!["INBOX".to_string()]));
    }
}
