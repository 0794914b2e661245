use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{JarvisError, Result};

// =============================================================================
// Thread identity
// =============================================================================

/// Identity of one conversation thread: the channel plus the thread root.
///
/// Kept as two separate fields so a channel or thread identifier containing
/// any delimiter can never collide with another pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadKey {
    pub channel_id: String,
    pub thread_id: String,
}

impl ThreadKey {
    pub fn new(channel_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Build a key from user-supplied identifiers, rejecting blank values.
    pub fn try_new(channel_id: &str, thread_id: &str) -> Result<Self> {
        let channel_id = channel_id.trim();
        let thread_id = thread_id.trim();
        if channel_id.is_empty() || thread_id.is_empty() {
            return Err(JarvisError::InvalidThreadKey(format!(
                "channel={:?} thread={:?}",
                channel_id, thread_id
            )));
        }
        Ok(Self::new(channel_id, thread_id))
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.thread_id)
    }
}

// =============================================================================
// Drafts
// =============================================================================

/// How a drafting conversation was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    /// Pipe-delimited `criar` command.
    Explicit,
    /// Free-text request such as "crie um bug no projeto X".
    NaturalLanguage,
    /// Request to build the card(s) from the thread history.
    ThreadBased,
}

impl fmt::Display for DraftSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftSource::Explicit => write!(f, "explicit"),
            DraftSource::NaturalLanguage => write!(f, "natural_language"),
            DraftSource::ThreadBased => write!(f, "thread_based"),
        }
    }
}

/// An in-progress issue description, possibly still missing fields.
///
/// The JSON shape matches what the extraction model is asked to return, so
/// every field defaults when absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueDraft {
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Ordered, duplicate-free.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl IssueDraft {
    /// Draft carrying only a summary.
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn needs_project(&self) -> bool {
        self.project.trim().is_empty()
    }

    pub fn needs_type(&self) -> bool {
        self.issue_type.trim().is_empty()
    }

    /// True when both required fields are present.
    pub fn is_complete(&self) -> bool {
        !self.needs_project() && !self.needs_type()
    }

    /// Replace project and type with any non-empty overrides.
    pub fn apply_overrides(&mut self, project: &str, issue_type: &str) {
        if !project.trim().is_empty() {
            self.project = project.trim().to_string();
        }
        if !issue_type.trim().is_empty() {
            self.issue_type = issue_type.trim().to_string();
        }
    }

    /// Copy with every text field trimmed and a blank priority dropped.
    pub fn trimmed(&self) -> Self {
        Self {
            project: self.project.trim().to_string(),
            issue_type: self.issue_type.trim().to_string(),
            summary: self.summary.trim().to_string(),
            description: self.description.trim().to_string(),
            priority: self
                .priority
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            labels: self.labels.clone(),
        }
    }
}

/// Identifiers returned by the ticketing system after a successful create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub id: String,
}
