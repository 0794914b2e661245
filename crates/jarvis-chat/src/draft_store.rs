//! Per-thread pending drafts with time-based expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use jarvis_core::types::{DraftSource, IssueDraft, ThreadKey};

/// Everything the engine remembers about one unfinished draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingState {
    pub created_at: DateTime<Utc>,
    pub thread: ThreadKey,
    /// Message that started the drafting conversation.
    pub origin_message_id: String,
    pub original_text: String,
    pub source: DraftSource,
    /// Single-card draft. Unused when `draft_queue` is non-empty.
    pub draft: IssueDraft,
    /// Multi-card queue, submitted in order on confirmation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub draft_queue: Vec<IssueDraft>,
    pub need_project: bool,
    pub need_type: bool,
}

impl PendingState {
    /// Fresh single-draft state stamped with the current time.
    pub fn single(
        thread: ThreadKey,
        origin_message_id: impl Into<String>,
        original_text: impl Into<String>,
        source: DraftSource,
        draft: IssueDraft,
    ) -> Self {
        let mut state = Self {
            created_at: Utc::now(),
            thread,
            origin_message_id: origin_message_id.into(),
            original_text: original_text.into(),
            source,
            draft,
            draft_queue: Vec::new(),
            need_project: false,
            need_type: false,
        };
        state.refresh_missing();
        state
    }

    /// Fresh multi-card state. The first queued draft doubles as `draft`.
    pub fn queue(
        thread: ThreadKey,
        origin_message_id: impl Into<String>,
        original_text: impl Into<String>,
        drafts: Vec<IssueDraft>,
    ) -> Self {
        let first = drafts.first().cloned().unwrap_or_default();
        let mut state = Self::single(
            thread,
            origin_message_id,
            original_text,
            DraftSource::ThreadBased,
            first,
        );
        state.draft_queue = drafts;
        state.refresh_missing();
        state
    }

    pub fn is_multi(&self) -> bool {
        !self.draft_queue.is_empty()
    }

    /// Recompute the missing-field flags from the current draft(s).
    pub fn refresh_missing(&mut self) {
        if self.is_multi() {
            self.need_project = self.draft_queue.iter().any(IssueDraft::needs_project);
            self.need_type = self.draft_queue.iter().any(IssueDraft::needs_type);
        } else {
            self.need_project = self.draft.needs_project();
            self.need_type = self.draft.needs_type();
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        ttl > Duration::zero() && now - self.created_at > ttl
    }
}

/// Thread-safe map from thread to pending draft.
///
/// Expired entries are dropped lazily on [`DraftStore::load`]; there is no
/// background sweeper.
pub struct DraftStore {
    ttl: Duration,
    entries: Mutex<HashMap<ThreadKey, PendingState>>,
}

impl DraftStore {
    /// Create a store whose entries live for `ttl`. A zero TTL never expires.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadKey, PendingState>> {
        // A panic elsewhere must not wedge every thread's drafts.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the pending state for its thread.
    pub fn save(&self, state: PendingState) {
        debug!(thread = %state.thread, source = %state.source, "Saving pending draft");
        self.lock().insert(state.thread.clone(), state);
    }

    /// Fetch a copy of the pending state, removing it if it has expired.
    pub fn load(&self, thread: &ThreadKey) -> Option<PendingState> {
        self.load_at(thread, Utc::now())
    }

    fn load_at(&self, thread: &ThreadKey, now: DateTime<Utc>) -> Option<PendingState> {
        let mut entries = self.lock();
        let expired = entries.get(thread)?.is_expired(self.ttl, now);
        if expired {
            entries.remove(thread);
            debug!(thread = %thread, "Pending draft expired");
            return None;
        }
        entries.get(thread).cloned()
    }

    /// Remove the pending state. Deleting an absent thread is a no-op.
    pub fn delete(&self, thread: &ThreadKey) {
        if self.lock().remove(thread).is_some() {
            debug!(thread = %thread, "Pending draft removed");
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(thread: &str) -> ThreadKey {
        ThreadKey::new("C1", thread)
    }

    fn state(thread: &str) -> PendingState {
        PendingState::single(
            key(thread),
            "m1",
            "jira criar X",
            DraftSource::Explicit,
            IssueDraft::with_summary("X"),
        )
    }

    #[test]
    fn test_load_after_save_returns_equal_state() {
        let store = DraftStore::new(Duration::minutes(120));
        let saved = state("t1");
        store.save(saved.clone());
        assert_eq!(store.load(&key("t1")), Some(saved));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_unknown_thread_is_none() {
        let store = DraftStore::new(Duration::minutes(120));
        store.save(state("t1"));
        assert!(store.load(&key("t2")).is_none());
        assert!(store.load(&ThreadKey::new("C2", "t1")).is_none());
    }

    #[test]
    fn test_expired_entry_is_removed_on_load() {
        let store = DraftStore::new(Duration::minutes(120));
        let mut old = state("t1");
        old.created_at = Utc::now() - Duration::minutes(121);
        store.save(old);

        assert!(store.load(&key("t1")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_entry_at_exact_ttl_is_still_valid() {
        let store = DraftStore::new(Duration::minutes(10));
        let saved = state("t1");
        let created = saved.created_at;
        store.save(saved);
        assert!(store
            .load_at(&key("t1"), created + Duration::minutes(10))
            .is_some());
        assert!(store
            .load_at(&key("t1"), created + Duration::minutes(10) + Duration::seconds(1))
            .is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let store = DraftStore::new(Duration::zero());
        let mut old = state("t1");
        old.created_at = Utc::now() - Duration::days(365);
        store.save(old);
        assert!(store.load(&key("t1")).is_some());
    }

    #[test]
    fn test_save_overwrites_and_delete_is_idempotent() {
        let store = DraftStore::new(Duration::minutes(5));
        store.save(state("t1"));
        let mut replacement = state("t1");
        replacement.draft.summary = "Y".to_string();
        store.save(replacement);

        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&key("t1")).unwrap().draft.summary, "Y");

        store.delete(&key("t1"));
        store.delete(&key("t1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_queue_flags_any_incomplete_draft() {
        let complete = IssueDraft {
            project: "BE".to_string(),
            issue_type: "Bug".to_string(),
            ..IssueDraft::default()
        };
        let untyped = IssueDraft {
            project: "BE".to_string(),
            ..IssueDraft::default()
        };
        let s = PendingState::queue(key("t1"), "m1", "dois cards", vec![complete.clone(), untyped]);
        assert!(s.is_multi());
        assert_eq!(s.draft, complete);
        assert!(!s.need_project);
        assert!(s.need_type);
    }

    #[test]
    fn test_concurrent_access_across_threads() {
        let store = Arc::new(DraftStore::new(Duration::minutes(5)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let thread = format!("t{}", i);
                    for _ in 0..50 {
                        store.save(state(&thread));
                        assert!(store.load(&key(&thread)).is_some());
                    }
                    if i % 2 == 0 {
                        store.delete(&key(&thread));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 4);
    }
}
