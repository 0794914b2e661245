//! Conversation engine: the per-thread drafting state machine.
//!
//! Each inbound message is matched against the command surface in a fixed
//! priority order (kill switch, explicit create, thread-based create,
//! natural-language create, define, confirm, cancel). The engine posts its
//! own replies through the chat collaborator and reports whether it handled
//! the message so the caller can fall back to other handling.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use jarvis_core::config::{ChatSettings, JarvisConfig};
use jarvis_core::types::{CreatedIssue, DraftSource, IssueDraft, ThreadKey};

use crate::collaborators::{Collaborators, ExtractionContext, NewIssue};
use crate::draft_store::{DraftStore, PendingState};
use crate::error::ChatError;
use crate::messages::{clip, Replies};
use crate::parser::CommandParser;
use crate::query::{default_for_intent, sanitize, ListingIntent};

/// Example issues requested as extraction style hints.
const EXAMPLE_ISSUE_LIMIT: usize = 3;

/// Where a thread's drafting conversation stands after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// No pending draft.
    Idle,
    /// A draft is stored but project and/or type are missing.
    AwaitingFields,
    /// A complete draft (or queue) waits for `confirmar`.
    AwaitingConfirmation,
    /// The conversation just ended: submitted or cancelled.
    Terminal,
}

/// Result of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// False when the message is not part of a drafting conversation.
    pub handled: bool,
    pub state: ConversationState,
}

impl TurnOutcome {
    fn handled(state: ConversationState) -> Self {
        Self {
            handled: true,
            state,
        }
    }

    fn not_handled(state: ConversationState) -> Self {
        Self {
            handled: false,
            state,
        }
    }
}

/// One chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub thread: ThreadKey,
    pub message_id: String,
    pub text: String,
    /// Transcript of the thread so far, used as extraction context.
    pub conversation: String,
}

impl IncomingMessage {
    pub fn new(thread: ThreadKey, message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            thread,
            message_id: message_id.into(),
            text: text.into(),
            conversation: String::new(),
        }
    }

    pub fn with_conversation(mut self, conversation: impl Into<String>) -> Self {
        self.conversation = conversation.into();
        self
    }
}

/// Settings the engine reads on every turn.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub chat: ChatSettings,
    pub bot_name: String,
    /// Tracker base URL for `/browse/KEY` links.
    pub base_url: String,
    /// Projects that scope canned listing queries.
    pub project_keys: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&JarvisConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &JarvisConfig) -> Self {
        Self {
            chat: config.chat.clone(),
            bot_name: config.general.bot_name.clone(),
            base_url: config.tracker.base_url.clone(),
            project_keys: config.tracker.project_keys.clone(),
        }
    }
}

/// Drives the create / define / confirm / cancel conversation.
pub struct ConversationEngine {
    parser: CommandParser,
    store: Arc<DraftStore>,
    collaborators: Collaborators,
    settings: EngineSettings,
    replies: Replies,
}

impl ConversationEngine {
    pub fn new(
        parser: CommandParser,
        store: Arc<DraftStore>,
        collaborators: Collaborators,
        settings: EngineSettings,
    ) -> Self {
        let replies = Replies::new(
            &settings.bot_name,
            parser.prefix(),
            &settings.base_url,
        );
        Self {
            parser,
            store,
            collaborators,
            settings,
            replies,
        }
    }

    /// Build parser, store and settings from configuration.
    pub fn from_config(config: &JarvisConfig, collaborators: Collaborators) -> Self {
        let parser = CommandParser::new(
            config.chat.command_prefix.clone(),
            config.tracker.project_aliases.clone(),
        );
        let store = Arc::new(DraftStore::new(config.chat.draft_ttl()));
        Self::new(parser, store, collaborators, EngineSettings::from_config(config))
    }

    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Sanitized canned query for a listing intent over the configured projects.
    pub fn listing_query(&self, intent: ListingIntent, question: &str) -> String {
        sanitize(&default_for_intent(
            intent,
            question,
            &self.settings.project_keys,
        ))
    }

    /// Current state of a thread, derived from the store.
    pub fn state_of(&self, thread: &ThreadKey) -> ConversationState {
        self.store
            .load(thread)
            .map(|state| pending_state_kind(&state))
            .unwrap_or(ConversationState::Idle)
    }

    /// Handle one message.
    ///
    /// Collaborator failures never surface here: they become replies and a
    /// defined state. The only error is an empty message.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<TurnOutcome, ChatError> {
        let text = msg.text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let span = info_span!(
            "turn",
            turn_id = %Uuid::new_v4(),
            channel = %msg.thread.channel_id,
            thread = %msg.thread.thread_id,
        );
        let outcome = self.dispatch(msg, text).instrument(span).await;
        debug!(handled = outcome.handled, state = ?outcome.state, "Turn finished");
        Ok(outcome)
    }

    async fn dispatch(&self, msg: &IncomingMessage, text: &str) -> TurnOutcome {
        let parser = &self.parser;
        let explicit = parser.parse_explicit_create(text);
        // `definir | titulo=Criar ...` edits the draft, it never opens a new one.
        let define = parser.is_define_command(text);
        let thread_based = !define && parser.is_thread_based_create(text);
        let natural = !define && parser.looks_like_create_intent(text);

        if !self.settings.chat.create_enabled && (explicit.is_some() || thread_based || natural) {
            info!("Creation request rejected: creation disabled");
            self.reply(&msg.thread, self.replies.for_error(&ChatError::CreationDisabled))
                .await;
            return TurnOutcome::handled(self.state_of(&msg.thread));
        }

        if let Some(draft) = explicit {
            return self.handle_explicit(msg, draft).await;
        }
        if thread_based {
            return self.handle_thread_based(msg, text).await;
        }
        if natural {
            return self.handle_natural_language(msg, text).await;
        }
        if define {
            return self.handle_define(msg, text).await;
        }
        if parser.is_confirm_command(text) {
            return self.handle_confirm(msg).await;
        }
        if parser.is_cancel_command(text) {
            return self.handle_cancel(msg).await;
        }

        TurnOutcome::not_handled(self.state_of(&msg.thread))
    }

    // -----------------------------------------------------------------
    // Creation paths
    // -----------------------------------------------------------------

    async fn handle_explicit(&self, msg: &IncomingMessage, mut draft: IssueDraft) -> TurnOutcome {
        self.default_summary(&mut draft);
        info!(
            project = %draft.project,
            issue_type = %draft.issue_type,
            source = %DraftSource::Explicit,
            "Create command parsed"
        );

        if draft.is_complete() {
            return self.create_now(msg, &draft).await;
        }
        self.park(msg, DraftSource::Explicit, draft).await
    }

    async fn handle_natural_language(&self, msg: &IncomingMessage, text: &str) -> TurnOutcome {
        if !self.collaborators.extractor.confirm_create_intent(text).await {
            info!("Create intent not confirmed, leaving message unhandled");
            return TurnOutcome::not_handled(self.state_of(&msg.thread));
        }

        let parsed = IssueDraft {
            project: self.parser.parse_project_key(text),
            issue_type: self.parser.parse_issue_type(text),
            summary: self.parser.parse_summary(text),
            ..IssueDraft::default()
        };
        let context = ExtractionContext {
            conversation: msg.conversation.clone(),
            request: text.to_string(),
            examples: self
                .example_issues(&parsed.project, &parsed.issue_type)
                .await,
        };

        let mut draft = match self.collaborators.extractor.extract_draft(&context).await {
            Ok(mut extracted) => {
                extracted.apply_overrides(&parsed.project, &parsed.issue_type);
                if !parsed.summary.is_empty() {
                    extracted.summary = parsed.summary.clone();
                }
                extracted
            }
            Err(e) => {
                warn!(error = %e, "Draft extraction failed, using the request as description");
                IssueDraft {
                    description: format!(
                        "Pedido do usuário:\n{}\n\nA confirmar: detalhes adicionais.",
                        text
                    ),
                    ..parsed
                }
            }
        };
        self.default_summary(&mut draft);

        if draft.is_complete() {
            return self.create_now(msg, &draft).await;
        }
        self.park(msg, DraftSource::NaturalLanguage, draft).await
    }

    async fn handle_thread_based(&self, msg: &IncomingMessage, text: &str) -> TurnOutcome {
        if !self.collaborators.extractor.confirm_create_intent(text).await {
            info!("Thread-based intent not confirmed, leaving message unhandled");
            return TurnOutcome::not_handled(self.state_of(&msg.thread));
        }

        let project = self.parser.parse_project_key(text);
        let issue_type = self.parser.parse_issue_type(text);

        if self.parser.is_multi_card_create(text) {
            let context = ExtractionContext {
                conversation: msg.conversation.clone(),
                request: text.to_string(),
                examples: Vec::new(),
            };
            let extracted = self
                .collaborators
                .extractor
                .extract_drafts(&context)
                .await
                .and_then(|drafts| {
                    if drafts.is_empty() {
                        Err(ChatError::external("extractor returned no drafts"))
                    } else {
                        Ok(drafts)
                    }
                });

            let mut drafts = match extracted {
                Ok(drafts) => drafts,
                Err(e) => {
                    warn!(error = %e, "Multi-card extraction failed");
                    self.reply(&msg.thread, self.replies.extraction_failed(true, &e))
                        .await;
                    return TurnOutcome::handled(self.state_of(&msg.thread));
                }
            };
            for draft in &mut drafts {
                draft.apply_overrides(&project, &issue_type);
                self.default_summary(draft);
            }
            info!(drafts = drafts.len(), "Multi-card drafts extracted");

            let state = PendingState::queue(
                msg.thread.clone(),
                msg.message_id.clone(),
                msg.text.clone(),
                drafts,
            );
            let kind = pending_state_kind(&state);
            let mut preview = self.replies.multi_preview(&state.draft_queue);
            if kind == ConversationState::AwaitingFields {
                preview.push_str("\n\n");
                preview.push_str(&self.replies.missing_fields(first_incomplete(&state)));
            }
            self.store.save(state);
            self.reply(&msg.thread, preview).await;
            return TurnOutcome::handled(kind);
        }

        let context = ExtractionContext {
            conversation: msg.conversation.clone(),
            request: text.to_string(),
            examples: self.example_issues(&project, &issue_type).await,
        };
        let mut draft = match self.collaborators.extractor.extract_draft(&context).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Draft extraction failed");
                self.reply(&msg.thread, self.replies.extraction_failed(false, &e))
                    .await;
                return TurnOutcome::handled(self.state_of(&msg.thread));
            }
        };
        draft.apply_overrides(&project, &issue_type);
        self.default_summary(&mut draft);

        if !draft.is_complete() {
            return self.park(msg, DraftSource::ThreadBased, draft).await;
        }
        let preview = self.replies.preview(&draft, true);
        self.store.save(PendingState::single(
            msg.thread.clone(),
            msg.message_id.clone(),
            msg.text.clone(),
            DraftSource::ThreadBased,
            draft,
        ));
        self.reply(&msg.thread, preview).await;
        TurnOutcome::handled(ConversationState::AwaitingConfirmation)
    }

    /// Store an incomplete draft and ask for what is missing.
    async fn park(&self, msg: &IncomingMessage, source: DraftSource, draft: IssueDraft) -> TurnOutcome {
        let state = PendingState::single(
            msg.thread.clone(),
            msg.message_id.clone(),
            msg.text.clone(),
            source,
            draft,
        );
        info!(
            source = %source,
            need_project = state.need_project,
            need_type = state.need_type,
            "Draft incomplete, waiting for fields"
        );
        let prompt = self.replies.missing_fields(&state.draft);
        self.store.save(state);
        self.reply(&msg.thread, prompt).await;
        TurnOutcome::handled(ConversationState::AwaitingFields)
    }

    /// Submit a complete draft that was never stored.
    async fn create_now(&self, msg: &IncomingMessage, draft: &IssueDraft) -> TurnOutcome {
        match self
            .submit(&msg.thread, &msg.message_id, &msg.text, draft)
            .await
        {
            Ok(created) => {
                self.reply(&msg.thread, self.replies.created(&created)).await;
                TurnOutcome::handled(ConversationState::Terminal)
            }
            Err(e) => {
                warn!(error = %e, "Issue creation failed");
                self.reply(&msg.thread, self.replies.for_error(&e)).await;
                TurnOutcome::handled(self.state_of(&msg.thread))
            }
        }
    }

    // -----------------------------------------------------------------
    // Follow-up commands
    // -----------------------------------------------------------------

    async fn handle_define(&self, msg: &IncomingMessage, text: &str) -> TurnOutcome {
        let Some(mut state) = self.store.load(&msg.thread) else {
            self.reply(&msg.thread, self.replies.for_error(&ChatError::NoPendingDraft))
                .await;
            return TurnOutcome::handled(ConversationState::Idle);
        };

        let updated = if state.is_multi() {
            let mut any = false;
            for draft in &mut state.draft_queue {
                any |= self.parser.apply_define(text, draft);
            }
            if let Some(first) = state.draft_queue.first() {
                state.draft = first.clone();
            }
            any
        } else {
            self.parser.apply_define(text, &mut state.draft)
        };

        if !updated {
            debug!("Define command without recognizable fields");
            self.reply(&msg.thread, self.replies.for_error(&ChatError::InvalidDefine))
                .await;
            return TurnOutcome::handled(pending_state_kind(&state));
        }

        state.refresh_missing();
        let kind = pending_state_kind(&state);
        let reply = match kind {
            ConversationState::AwaitingFields => {
                self.replies.missing_fields(first_incomplete(&state))
            }
            _ if state.is_multi() => self.replies.multi_preview(&state.draft_queue),
            _ => self.replies.preview(&state.draft, true),
        };
        info!(
            need_project = state.need_project,
            need_type = state.need_type,
            "Pending draft updated"
        );
        self.store.save(state);
        self.reply(&msg.thread, reply).await;
        TurnOutcome::handled(kind)
    }

    async fn handle_confirm(&self, msg: &IncomingMessage) -> TurnOutcome {
        let Some(state) = self.store.load(&msg.thread) else {
            self.reply(&msg.thread, self.replies.nothing_to_confirm()).await;
            return TurnOutcome::handled(ConversationState::Idle);
        };

        if state.is_multi() {
            return self.confirm_queue(msg, &state).await;
        }

        if !state.draft.is_complete() {
            self.reply(&msg.thread, self.replies.missing_fields(&state.draft))
                .await;
            return TurnOutcome::handled(ConversationState::AwaitingFields);
        }

        match self
            .submit(
                &state.thread,
                &state.origin_message_id,
                &state.original_text,
                &state.draft,
            )
            .await
        {
            Ok(created) => {
                self.store.delete(&msg.thread);
                self.reply(&msg.thread, self.replies.created(&created)).await;
                TurnOutcome::handled(ConversationState::Terminal)
            }
            Err(e) => {
                warn!(error = %e, "Issue creation failed, draft kept for retry");
                self.reply(&msg.thread, self.replies.for_error(&e)).await;
                TurnOutcome::handled(ConversationState::AwaitingConfirmation)
            }
        }
    }

    /// Submit a multi-card queue in order.
    ///
    /// A failure stops the batch and leaves the stored state untouched, so
    /// cards created before the failure are not removed from the queue.
    async fn confirm_queue(&self, msg: &IncomingMessage, state: &PendingState) -> TurnOutcome {
        if let Some(incomplete) = state.draft_queue.iter().find(|d| !d.is_complete()) {
            self.reply(&msg.thread, self.replies.missing_fields(incomplete))
                .await;
            return TurnOutcome::handled(ConversationState::AwaitingFields);
        }

        let total = state.draft_queue.len();
        for (i, draft) in state.draft_queue.iter().enumerate() {
            debug!(index = i + 1, total, project = %draft.project, "Submitting queued draft");
            match self
                .submit(
                    &state.thread,
                    &state.origin_message_id,
                    &state.original_text,
                    draft,
                )
                .await
            {
                Ok(created) => {
                    self.reply(&msg.thread, self.replies.created(&created)).await;
                }
                Err(e) => {
                    warn!(error = %e, index = i + 1, total, "Batch stopped");
                    self.reply(&msg.thread, self.replies.for_error(&e)).await;
                    return TurnOutcome::handled(ConversationState::AwaitingConfirmation);
                }
            }
        }

        self.store.delete(&msg.thread);
        info!(total, "All queued drafts created");
        TurnOutcome::handled(ConversationState::Terminal)
    }

    async fn handle_cancel(&self, msg: &IncomingMessage) -> TurnOutcome {
        if self.store.load(&msg.thread).is_none() {
            self.reply(&msg.thread, self.replies.for_error(&ChatError::NoPendingDraft))
                .await;
            return TurnOutcome::handled(ConversationState::Idle);
        }
        self.store.delete(&msg.thread);
        info!("Pending draft cancelled");
        self.reply(&msg.thread, self.replies.cancelled()).await;
        TurnOutcome::handled(ConversationState::Terminal)
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    async fn submit(
        &self,
        thread: &ThreadKey,
        origin_message_id: &str,
        original_text: &str,
        draft: &IssueDraft,
    ) -> Result<CreatedIssue, ChatError> {
        let mut draft = draft.trimmed();
        draft.description = self
            .with_origin_footer(thread, origin_message_id, original_text, &draft.description)
            .await;
        let issue = NewIssue::from_draft(&draft)?;

        info!(project = %issue.project, issue_type = %issue.issue_type, "Submitting issue");
        let created = self.collaborators.tracker.create_issue(&issue).await?;
        info!(key = %created.key, "Issue created");
        Ok(created)
    }

    /// Append the "Thread de origem" section pointing back at the chat.
    async fn with_origin_footer(
        &self,
        thread: &ThreadKey,
        origin_message_id: &str,
        original_text: &str,
        description: &str,
    ) -> String {
        let chat = &self.collaborators.chat;
        let mut out = description.trim().to_string();
        out.push_str("\n\n---\nThread de origem\n\n");

        match chat.permalink(&thread.channel_id, origin_message_id).await {
            Ok(link) => out.push_str(&format!("- Mensagem original: {}\n", link)),
            Err(e) => {
                debug!(error = %e, "Origin permalink unavailable");
                out.push_str(&format!(
                    "- Mensagem original: (link indisponível) ts={}\n",
                    origin_message_id
                ));
            }
        }

        if !thread.thread_id.is_empty() && thread.thread_id != origin_message_id {
            if let Ok(link) = chat.permalink(&thread.channel_id, &thread.thread_id).await {
                out.push_str(&format!("- Thread (raiz): {}\n", link));
            }
        }

        if !original_text.trim().is_empty() {
            let command = clip(original_text, self.settings.chat.max_origin_command_chars);
            out.push_str(&format!("\n- Comando: {:?}\n", command));
        }
        out
    }

    async fn example_issues(&self, project: &str, issue_type: &str) -> Vec<String> {
        if project.trim().is_empty() || issue_type.trim().is_empty() {
            return Vec::new();
        }
        match self
            .collaborators
            .tracker
            .example_issues(project, issue_type, EXAMPLE_ISSUE_LIMIT)
            .await
        {
            Ok(examples) => {
                debug!(count = examples.len(), project, issue_type, "Example issues loaded");
                examples
            }
            Err(e) => {
                warn!(error = %e, project, issue_type, "Example issues unavailable");
                Vec::new()
            }
        }
    }

    fn default_summary(&self, draft: &mut IssueDraft) {
        if draft.summary.trim().is_empty() {
            draft.summary = self.settings.chat.default_summary.clone();
        }
    }

    async fn reply(&self, thread: &ThreadKey, text: String) {
        if let Err(e) = self.collaborators.chat.post_reply(thread, &text).await {
            warn!(error = %e, "Failed to post reply");
        }
    }
}

fn pending_state_kind(state: &PendingState) -> ConversationState {
    if state.need_project || state.need_type {
        ConversationState::AwaitingFields
    } else {
        ConversationState::AwaitingConfirmation
    }
}

fn first_incomplete(state: &PendingState) -> &IssueDraft {
    state
        .draft_queue
        .iter()
        .find(|d| !d.is_complete())
        .unwrap_or(&state.draft)
}
