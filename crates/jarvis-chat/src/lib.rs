//! Chat-driven issue drafting for Jarvis.
//!
//! Parses commands typed in a conversation thread, keeps per-thread drafts
//! in a TTL-bounded store, and drives the create / define / confirm / cancel
//! conversation until a ticket is submitted. Also hosts the query
//! canonicalizer and the Markdown to rich-document converter used when
//! talking to the ticketing system.

pub mod collaborators;
pub mod document;
pub mod draft_store;
pub mod error;
pub mod messages;
pub mod mock;
pub mod orchestrator;
pub mod parser;
pub mod query;

pub use collaborators::{
    ChatPlatform, Collaborators, DraftExtractor, ExtractionContext, IssueTracker, NewIssue,
};
pub use document::{markdown_to_document, Block, Document, TaskItem, TaskState, TextSpan};
pub use draft_store::{DraftStore, PendingState};
pub use error::ChatError;
pub use messages::Replies;
pub use orchestrator::{
    ConversationEngine, ConversationState, EngineSettings, IncomingMessage, TurnOutcome,
};
pub use parser::{CommandParser, InlineExtras};
pub use query::{default_for_intent, extract_text_query, fix_precedence, sanitize, ListingIntent};
