//! Error types for the drafting conversation.

use jarvis_core::error::JarvisError;

/// Errors raised while handling a chat turn.
///
/// None of these are fatal: the engine turns each one into a reply and a
/// well-defined state transition.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("draft is missing required fields: {}", missing_list(.project, .issue_type))]
    MissingFields { project: bool, issue_type: bool },
    #[error("define command has no recognizable key=value pair")]
    InvalidDefine,
    #[error("no pending draft for this thread")]
    NoPendingDraft,
    #[error("issue creation is disabled")]
    CreationDisabled,
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl ChatError {
    /// Shorthand for collaborator failures.
    pub fn external(msg: impl Into<String>) -> Self {
        ChatError::ExternalService(msg.into())
    }

    /// Whether the error came from a collaborator rather than the user.
    pub fn is_external(&self) -> bool {
        matches!(self, ChatError::ExternalService(_))
    }
}

fn missing_list(project: &bool, issue_type: &bool) -> String {
    let mut missing = Vec::new();
    if *project {
        missing.push("project");
    }
    if *issue_type {
        missing.push("issue type");
    }
    missing.join(", ")
}

impl From<JarvisError> for ChatError {
    fn from(err: JarvisError) -> Self {
        ChatError::ExternalService(err.to_string())
    }
}
