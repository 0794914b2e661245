//! Scripted collaborators for tests and benchmarks.
//!
//! Each mock records what the engine asked of it so tests can assert on
//! replies, submitted issues and extraction inputs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use jarvis_core::types::{CreatedIssue, IssueDraft, ThreadKey};

use crate::collaborators::{
    ChatPlatform, Collaborators, DraftExtractor, ExtractionContext, IssueTracker, NewIssue,
};
use crate::error::ChatError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MockExtractor
// =============================================================================

/// Extractor returning canned drafts.
pub struct MockExtractor {
    intent: bool,
    draft: Result<IssueDraft, String>,
    drafts: Result<Vec<IssueDraft>, String>,
    contexts: Mutex<Vec<ExtractionContext>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Confirms every intent and extracts an empty draft.
    pub fn new() -> Self {
        Self {
            intent: true,
            draft: Ok(IssueDraft::default()),
            drafts: Ok(Vec::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_intent(mut self, confirmed: bool) -> Self {
        self.intent = confirmed;
        self
    }

    pub fn with_draft(mut self, draft: IssueDraft) -> Self {
        self.draft = Ok(draft);
        self
    }

    pub fn with_drafts(mut self, drafts: Vec<IssueDraft>) -> Self {
        self.drafts = Ok(drafts);
        self
    }

    /// Make both extraction calls fail with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.draft = Err(message.to_string());
        self.drafts = Err(message.to_string());
        self
    }

    /// Every context passed to an extraction call, in order.
    pub fn contexts(&self) -> Vec<ExtractionContext> {
        lock(&self.contexts).clone()
    }
}

#[async_trait]
impl DraftExtractor for MockExtractor {
    async fn confirm_create_intent(&self, _text: &str) -> bool {
        self.intent
    }

    async fn extract_draft(&self, context: &ExtractionContext) -> Result<IssueDraft, ChatError> {
        lock(&self.contexts).push(context.clone());
        self.draft.clone().map_err(ChatError::external)
    }

    async fn extract_drafts(
        &self,
        context: &ExtractionContext,
    ) -> Result<Vec<IssueDraft>, ChatError> {
        lock(&self.contexts).push(context.clone());
        self.drafts.clone().map_err(ChatError::external)
    }
}

// =============================================================================
// MockTracker
// =============================================================================

/// Tracker that records submissions and can fail a chosen call.
#[derive(Default)]
pub struct MockTracker {
    calls: AtomicUsize,
    /// 1-based index of the `create_issue` call that fails.
    fail_on: Option<usize>,
    created: Mutex<Vec<NewIssue>>,
    examples: Vec<String>,
    example_requests: Mutex<Vec<(String, String)>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = examples;
        self
    }

    /// Issues accepted so far, in submission order.
    pub fn created(&self) -> Vec<NewIssue> {
        lock(&self.created).clone()
    }

    /// Number of `create_issue` calls, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn example_requests(&self) -> Vec<(String, String)> {
        lock(&self.example_requests).clone()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, ChatError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(ChatError::external(format!("status=500 on call {}", call)));
        }
        let mut created = lock(&self.created);
        created.push(issue.clone());
        Ok(CreatedIssue {
            key: format!("{}-{}", issue.project, created.len()),
            id: (10_000 + call).to_string(),
        })
    }

    async fn example_issues(
        &self,
        project: &str,
        issue_type: &str,
        limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        lock(&self.example_requests).push((project.to_string(), issue_type.to_string()));
        Ok(self.examples.iter().take(limit).cloned().collect())
    }
}

// =============================================================================
// MockChat
// =============================================================================

/// Chat platform that records replies.
pub struct MockChat {
    permalinks: bool,
    replies: Mutex<Vec<(ThreadKey, String)>>,
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChat {
    /// Resolves permalinks as `https://chat.example/<channel>/p<message>`.
    pub fn new() -> Self {
        Self {
            permalinks: true,
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Every permalink lookup fails.
    pub fn without_permalinks(mut self) -> Self {
        self.permalinks = false;
        self
    }

    pub fn replies(&self) -> Vec<String> {
        lock(&self.replies).iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn replies_in(&self, thread: &ThreadKey) -> Vec<String> {
        lock(&self.replies)
            .iter()
            .filter(|(key, _)| key == thread)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_reply(&self) -> Option<String> {
        lock(&self.replies).last().map(|(_, text)| text.clone())
    }
}

#[async_trait]
impl ChatPlatform for MockChat {
    async fn post_reply(&self, thread: &ThreadKey, text: &str) -> Result<(), ChatError> {
        lock(&self.replies).push((thread.clone(), text.to_string()));
        Ok(())
    }

    async fn permalink(&self, channel_id: &str, message_id: &str) -> Result<String, ChatError> {
        if !self.permalinks {
            return Err(ChatError::external("permalink lookup failed"));
        }
        Ok(format!(
            "https://chat.example/{}/p{}",
            channel_id,
            message_id.replace('.', "")
        ))
    }
}

/// The three mocks wired into a [`Collaborators`] bundle, with handles kept
/// for assertions.
pub struct MockSet {
    pub extractor: Arc<MockExtractor>,
    pub tracker: Arc<MockTracker>,
    pub chat: Arc<MockChat>,
}

impl MockSet {
    pub fn new(extractor: MockExtractor, tracker: MockTracker, chat: MockChat) -> Self {
        Self {
            extractor: Arc::new(extractor),
            tracker: Arc::new(tracker),
            chat: Arc::new(chat),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.extractor.clone(),
            self.tracker.clone(),
            self.chat.clone(),
        )
    }
}

impl Default for MockSet {
    fn default() -> Self {
        Self::new(MockExtractor::new(), MockTracker::new(), MockChat::new())
    }
}
