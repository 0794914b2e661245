//! Offline console session.
//!
//! Wires the conversation engine to collaborators that need no network:
//! an in-memory tracker, an extractor that builds drafts from the thread
//! transcript with the command parser, and a chat that prints to stdout.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info};

use jarvis_chat::parser::{clean_title, extract_issue_key};
use jarvis_chat::{
    ChatError, ChatPlatform, Collaborators, CommandParser, ConversationEngine, DraftExtractor,
    ExtractionContext, IncomingMessage, IssueTracker, ListingIntent, NewIssue, TurnOutcome,
};
use jarvis_core::config::JarvisConfig;
use jarvis_core::types::{CreatedIssue, IssueDraft, ThreadKey};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// InMemoryTracker
// =============================================================================

/// Tracker that keeps issues in memory and numbers keys per project.
#[derive(Default)]
pub struct InMemoryTracker {
    issues: Mutex<Vec<(CreatedIssue, NewIssue)>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of every stored issue, oldest first.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.issues).iter().map(|(c, _)| c.key.clone()).collect()
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, ChatError> {
        let mut issues = lock(&self.issues);
        let seq = issues
            .iter()
            .filter(|(_, i)| i.project == issue.project)
            .count()
            + 1;
        let created = CreatedIssue {
            key: format!("{}-{}", issue.project, seq),
            id: (10_000 + issues.len() + 1).to_string(),
        };
        info!(key = %created.key, issue_type = %issue.issue_type, "Issue stored in memory");
        issues.push((created.clone(), issue.clone()));
        Ok(created)
    }

    async fn example_issues(
        &self,
        project: &str,
        issue_type: &str,
        limit: usize,
    ) -> Result<Vec<String>, ChatError> {
        Ok(lock(&self.issues)
            .iter()
            .rev()
            .filter(|(_, i)| i.project == project && i.issue_type == issue_type)
            .take(limit)
            .map(|(c, i)| format!("Key: {}\nResumo: {}\n{}", c.key, i.summary, i.description.plain_text()))
            .collect())
    }
}

// =============================================================================
// TranscriptExtractor
// =============================================================================

/// Builds drafts from the transcript with the deterministic parser.
///
/// The intent gate accepts whatever passes the keyword pre-filters.
pub struct TranscriptExtractor {
    parser: CommandParser,
}

impl TranscriptExtractor {
    pub fn new(parser: CommandParser) -> Self {
        Self { parser }
    }

    /// Transcript lines that carry content, without speaker prefixes and
    /// without bot commands.
    fn topics(&self, conversation: &str) -> Vec<String> {
        conversation
            .lines()
            .map(|line| match line.split_once(": ") {
                Some((_, text)) => text.trim(),
                None => line.trim(),
            })
            .filter(|text| !text.is_empty())
            .filter(|text| !self.is_command(text))
            .map(str::to_string)
            .collect()
    }

    fn is_command(&self, text: &str) -> bool {
        let p = &self.parser;
        p.parse_explicit_create(text).is_some()
            || p.is_define_command(text)
            || p.is_confirm_command(text)
            || p.is_cancel_command(text)
            || p.looks_like_create_intent(text)
            || p.is_thread_based_create(text)
    }

    fn field(&self, request: &str, topics: &[String], parse: impl Fn(&str) -> String) -> String {
        let found = parse(request);
        if !found.is_empty() {
            return found;
        }
        topics
            .iter()
            .rev()
            .map(|t| parse(t))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    fn description(topics: &[String]) -> String {
        let mut out = String::from("## Contexto\n");
        for topic in topics {
            out.push_str(&format!("- {}\n", topic));
        }
        if let Some(key) = topics.iter().find_map(|t| extract_issue_key(t)) {
            out.push_str(&format!("\nRelacionado: **{}**\n", key));
        }
        out
    }
}

/// How many cards a plural request asks for.
fn requested_count(request: &str) -> usize {
    let low = request.to_lowercase();
    if low.contains("três") || low.contains("tres") {
        3
    } else {
        2
    }
}

#[async_trait]
impl DraftExtractor for TranscriptExtractor {
    async fn confirm_create_intent(&self, text: &str) -> bool {
        self.parser.looks_like_create_intent(text) || self.parser.is_thread_based_create(text)
    }

    async fn extract_draft(&self, context: &ExtractionContext) -> Result<IssueDraft, ChatError> {
        let topics = self.topics(&context.conversation);
        debug!(topics = topics.len(), examples = context.examples.len(), "Extracting draft");

        let mut summary = self.parser.parse_summary(&context.request);
        if summary.is_empty() {
            summary = topics.last().map(|t| clean_title(t)).unwrap_or_default();
        }
        Ok(IssueDraft {
            project: self.field(&context.request, &topics, |t| self.parser.parse_project_key(t)),
            issue_type: self.field(&context.request, &topics, |t| self.parser.parse_issue_type(t)),
            summary,
            description: Self::description(&topics),
            ..IssueDraft::default()
        })
    }

    async fn extract_drafts(
        &self,
        context: &ExtractionContext,
    ) -> Result<Vec<IssueDraft>, ChatError> {
        let topics = self.topics(&context.conversation);
        if topics.is_empty() {
            return Err(ChatError::external("nenhuma mensagem na thread para montar os cards"));
        }

        let count = requested_count(&context.request).min(topics.len());
        let chosen = &topics[topics.len() - count..];
        debug!(drafts = chosen.len(), "Extracting drafts");
        Ok(chosen
            .iter()
            .map(|topic| IssueDraft {
                project: self.parser.parse_project_key(topic),
                issue_type: self.parser.parse_issue_type(topic),
                summary: clean_title(topic),
                description: Self::description(std::slice::from_ref(topic)),
                ..IssueDraft::default()
            })
            .collect())
    }
}

// =============================================================================
// StdoutChat
// =============================================================================

/// Prints replies to stdout, prefixed with the bot name.
pub struct StdoutChat {
    bot_name: String,
}

impl StdoutChat {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }
}

#[async_trait]
impl ChatPlatform for StdoutChat {
    async fn post_reply(&self, thread: &ThreadKey, text: &str) -> Result<(), ChatError> {
        debug!(thread = %thread, "Posting reply");
        println!("{}: {}\n", self.bot_name, text);
        Ok(())
    }

    async fn permalink(&self, channel_id: &str, message_id: &str) -> Result<String, ChatError> {
        Ok(format!("console://{}/{}", channel_id, message_id))
    }
}

// =============================================================================
// ConsoleSession
// =============================================================================

/// One chat thread fed line by line.
pub struct ConsoleSession {
    engine: ConversationEngine,
    thread: ThreadKey,
    transcript: Vec<String>,
    seq: u64,
}

impl ConsoleSession {
    pub fn new(config: &JarvisConfig, thread: ThreadKey, collaborators: Collaborators) -> Self {
        Self {
            engine: ConversationEngine::from_config(config, collaborators),
            thread,
            transcript: Vec::new(),
            seq: 0,
        }
    }

    /// Offline collaborators for `config`, with the tracker handle kept.
    pub fn offline(config: &JarvisConfig, thread: ThreadKey) -> (Self, Arc<InMemoryTracker>) {
        let parser = CommandParser::new(
            config.chat.command_prefix.clone(),
            config.tracker.project_aliases.clone(),
        );
        let tracker = Arc::new(InMemoryTracker::new());
        let collaborators = Collaborators::new(
            Arc::new(TranscriptExtractor::new(parser)),
            tracker.clone(),
            Arc::new(StdoutChat::new(config.general.bot_name.clone())),
        );
        (Self::new(config, thread, collaborators), tracker)
    }

    /// Canned listing query for the configured projects.
    pub fn listing_query(&self, intent: ListingIntent) -> String {
        self.engine.listing_query(intent, "")
    }

    /// Feed one line. Blank lines are skipped and return `None`.
    pub async fn handle_line(&mut self, line: &str) -> Option<TurnOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.seq += 1;
        // The first message is the thread root.
        let message_id = if self.seq == 1 {
            self.thread.thread_id.clone()
        } else {
            format!("{}-{}", self.thread.thread_id, self.seq)
        };
        let msg = IncomingMessage::new(self.thread.clone(), message_id, line)
            .with_conversation(self.transcript.join("\n"));
        self.transcript.push(format!("user: {}", line));

        match self.engine.handle_message(&msg).await {
            Ok(outcome) => {
                if !outcome.handled {
                    debug!("Message not part of a drafting conversation");
                }
                Some(outcome)
            }
            Err(e) => {
                debug!(error = %e, "Message skipped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_chat::ConversationState;
    use std::collections::BTreeMap;

    fn config() -> JarvisConfig {
        let mut config = JarvisConfig::default();
        config.tracker.project_aliases =
            BTreeMap::from([("backend".to_string(), "BE".to_string())]);
        config
    }

    fn extractor() -> TranscriptExtractor {
        TranscriptExtractor::new(CommandParser::new(
            "jira",
            BTreeMap::from([("backend".to_string(), "BE".to_string())]),
        ))
    }

    #[tokio::test]
    async fn test_tracker_numbers_keys_per_project() {
        let tracker = InMemoryTracker::new();
        let mut draft = IssueDraft {
            project: "BE".to_string(),
            issue_type: "Bug".to_string(),
            summary: "a".to_string(),
            ..IssueDraft::default()
        };
        let first = tracker.create_issue(&NewIssue::from_draft(&draft).unwrap()).await.unwrap();
        draft.project = "OPS".to_string();
        let other = tracker.create_issue(&NewIssue::from_draft(&draft).unwrap()).await.unwrap();
        draft.project = "BE".to_string();
        let second = tracker.create_issue(&NewIssue::from_draft(&draft).unwrap()).await.unwrap();

        assert_eq!(first.key, "BE-1");
        assert_eq!(other.key, "OPS-1");
        assert_eq!(second.key, "BE-2");
        assert_eq!(second.id, "10003");

        let examples = tracker.example_issues("BE", "Bug", 1).await.unwrap();
        assert_eq!(examples.len(), 1);
        assert!(examples[0].starts_with("Key: BE-2"));
    }

    #[tokio::test]
    async fn test_extract_draft_from_transcript() {
        let context = ExtractionContext {
            conversation: "ana: o export de CSV quebra no backend, ver BE-12\nbeto: acontece desde ontem."
                .to_string(),
            request: "com base nessa thread crie um bug".to_string(),
            examples: Vec::new(),
        };
        let draft = extractor().extract_draft(&context).await.unwrap();
        assert_eq!(draft.project, "BE");
        assert_eq!(draft.issue_type, "Bug");
        assert_eq!(draft.summary, "acontece desde ontem");
        assert!(draft.description.starts_with("## Contexto\n- o export de CSV"));
        assert!(draft.description.contains("Relacionado: **BE-12**"));
    }

    #[tokio::test]
    async fn test_extract_drafts_takes_requested_count() {
        let context = ExtractionContext {
            conversation: "user: login lento\nuser: export falha\nuser: tela branca no app\nuser: confirmar"
                .to_string(),
            request: "crie dois cards com base nessa thread".to_string(),
            examples: Vec::new(),
        };
        let drafts = extractor().extract_drafts(&context).await.unwrap();
        let summaries: Vec<&str> = drafts.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["export falha", "tela branca no app"]);

        let empty = ExtractionContext::default();
        assert!(extractor().extract_drafts(&empty).await.unwrap_err().is_external());
    }

    #[tokio::test]
    async fn test_intent_gate_matches_prefilters() {
        let e = extractor();
        assert!(e.confirm_create_intent("crie um card").await);
        assert!(e.confirm_create_intent("card a partir da thread").await);
        assert!(!e.confirm_create_intent("bom dia").await);
    }

    #[test]
    fn test_listing_scope_follows_project_keys() {
        let mut config = config();
        config.apply_overrides_from(|key| (key == "JIRA_PROJECT_KEYS").then(|| "BE,PAY".to_string()));
        let (session, _) = ConsoleSession::offline(&config, ThreadKey::new("console", "1700.1"));
        assert_eq!(
            session.listing_query(ListingIntent::Default),
            "project in (BE, PAY) ORDER BY updated DESC"
        );
        assert_eq!(
            session.listing_query(ListingIntent::OpenBugs),
            "project in (BE, PAY) AND issuetype = Bug AND statusCategory != Done ORDER BY updated DESC"
        );
    }

    #[tokio::test]
    async fn test_session_drafts_and_confirms() {
        let (mut session, tracker) = ConsoleSession::offline(&config(), ThreadKey::new("console", "1700.1"));

        assert!(session.handle_line("   ").await.is_none());
        let outcome = session.handle_line("o login no backend falha com senha longa").await.unwrap();
        assert!(!outcome.handled);

        let outcome = session
            .handle_line("com base nessa thread crie um bug")
            .await
            .unwrap();
        assert_eq!(outcome.state, ConversationState::AwaitingConfirmation);

        let outcome = session.handle_line("confirmar").await.unwrap();
        assert_eq!(outcome.state, ConversationState::Terminal);
        assert_eq!(tracker.keys(), vec!["BE-1"]);
        assert!(session.engine.store().is_empty());
    }
}
