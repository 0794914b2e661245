//! External capabilities the conversation engine depends on.
//!
//! The engine never talks to a network service directly: draft extraction,
//! issue submission and chat replies go through these traits so the state
//! machine can be driven deterministically in tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use jarvis_core::types::{CreatedIssue, IssueDraft, ThreadKey};

use crate::document::{markdown_to_document, Document};
use crate::error::ChatError;

/// Input handed to the draft extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionContext {
    /// Thread transcript, oldest message first.
    pub conversation: String,
    /// The message that asked for the card(s).
    pub request: String,
    /// Recent issues of the same project and type, used as style hints.
    pub examples: Vec<String>,
}

/// Model-backed understanding of creation requests.
#[async_trait]
pub trait DraftExtractor: Send + Sync {
    /// Second opinion on a keyword match. Implementations return false on
    /// their own failures.
    async fn confirm_create_intent(&self, text: &str) -> bool;

    /// Build one draft from the conversation.
    async fn extract_draft(&self, context: &ExtractionContext) -> Result<IssueDraft, ChatError>;

    /// Build an ordered list of drafts from the conversation.
    async fn extract_drafts(
        &self,
        context: &ExtractionContext,
    ) -> Result<Vec<IssueDraft>, ChatError>;
}

/// The ticketing system.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, ChatError>;

    /// Up to `limit` recent issues of the given project and type, each
    /// rendered as text.
    async fn example_issues(
        &self,
        _project: &str,
        _issue_type: &str,
        _limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        Ok(Vec::new())
    }
}

/// The chat platform the conversation happens on.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn post_reply(&self, thread: &ThreadKey, text: &str) -> Result<(), ChatError>;

    /// Permanent link to a message.
    async fn permalink(&self, channel_id: &str, message_id: &str) -> Result<String, ChatError>;
}

/// Bundle of collaborator handles shared by the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn DraftExtractor>,
    pub tracker: Arc<dyn IssueTracker>,
    pub chat: Arc<dyn ChatPlatform>,
}

impl Collaborators {
    pub fn new(
        extractor: Arc<dyn DraftExtractor>,
        tracker: Arc<dyn IssueTracker>,
        chat: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            extractor,
            tracker,
            chat,
        }
    }
}

// =============================================================================
// NewIssue
// =============================================================================

/// A validated issue ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    pub description: Document,
    pub priority: Option<String>,
    pub labels: Vec<String>,
}

impl NewIssue {
    /// Validate a draft and convert its Markdown description.
    ///
    /// Fails with [`ChatError::MissingFields`] when project or type is blank.
    pub fn from_draft(draft: &IssueDraft) -> Result<Self, ChatError> {
        let draft = draft.trimmed();
        if !draft.is_complete() {
            return Err(ChatError::MissingFields {
                project: draft.needs_project(),
                issue_type: draft.needs_type(),
            });
        }
        Ok(Self {
            description: markdown_to_document(&draft.description),
            project: draft.project,
            issue_type: draft.issue_type,
            summary: draft.summary,
            priority: draft.priority,
            labels: draft.labels,
        })
    }

    /// Create-issue request body: `{"fields": {...}}`.
    pub fn to_fields(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("project".into(), json!({"key": self.project}));
        fields.insert("issuetype".into(), json!({"name": self.issue_type}));
        fields.insert("summary".into(), json!(self.summary));
        fields.insert("description".into(), self.description.to_value());
        if let Some(priority) = &self.priority {
            fields.insert("priority".into(), json!({"name": priority}));
        }
        if !self.labels.is_empty() {
            fields.insert("labels".into(), json!(self.labels));
        }
        json!({ "fields": fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> IssueDraft {
        IssueDraft {
            project: " BE ".to_string(),
            issue_type: "Bug".to_string(),
            summary: "Login falha".to_string(),
            description: "## Contexto\n- passo **1**".to_string(),
            priority: None,
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_from_draft_requires_project_and_type() {
        let mut d = draft();
        d.project = "  ".to_string();
        d.issue_type = String::new();
        let err = NewIssue::from_draft(&d).unwrap_err();
        assert!(matches!(
            err,
            ChatError::MissingFields {
                project: true,
                issue_type: true
            }
        ));
    }

    #[test]
    fn test_to_fields_minimal() {
        let issue = NewIssue::from_draft(&draft()).unwrap();
        let body = issue.to_fields();
        let fields = &body["fields"];
        assert_eq!(fields["project"]["key"], "BE");
        assert_eq!(fields["issuetype"]["name"], "Bug");
        assert_eq!(fields["summary"], "Login falha");
        assert_eq!(fields["description"]["type"], "doc");
        assert_eq!(fields["description"]["content"][0]["type"], "heading");
        assert!(fields.get("priority").is_none());
        assert!(fields.get("labels").is_none());
    }

    #[test]
    fn test_to_fields_with_priority_and_labels() {
        let mut d = draft();
        d.priority = Some("High".to_string());
        d.labels = vec!["auth".to_string(), "web".to_string()];
        let body = NewIssue::from_draft(&d).unwrap().to_fields();
        assert_eq!(body["fields"]["priority"]["name"], "High");
        assert_eq!(body["fields"]["labels"], json!(["auth", "web"]));
    }

    #[test]
    fn test_blank_priority_is_omitted() {
        let mut d = draft();
        d.priority = Some("   ".to_string());
        let issue = NewIssue::from_draft(&d).unwrap();
        assert!(issue.priority.is_none());
    }
}
