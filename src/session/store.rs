//! In-memory conversation state for one console session.
//!
//! Holds the visible transcript, the sidebar query history, and the
//! monotonic message-id counter. Nothing is persisted: the session is the
//! lifetime, and a single logical thread mutates the store per pass.

use uuid::Uuid;

use crate::models::{ChatMessage, HistoryEntry};

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Greeting shown at startup and after a reset.
pub const GREETING: &str =
    "I'm your clinical assistant. Enter a disease or symptom name to start.";

/// Fixed anchor of the seed greeting message.
pub const GREETING_ID: &str = "init_msg";

// ═══════════════════════════════════════════════════════════
// ConversationStore
// ═══════════════════════════════════════════════════════════

/// Append-only message log, append-only history log (with one mutable field,
/// the recorded response), and the id counter.
pub struct ConversationStore {
    session_id: Uuid,
    messages: Vec<ChatMessage>,
    history: Vec<HistoryEntry>,
    msg_counter: u64,
}

impl ConversationStore {
    /// A fresh session: the seed greeting, empty history, counter at 0.
    pub fn new() -> Self {
        let session_id = Uuid::new_v4();
        tracing::debug!(session = %session_id, "conversation session opened");
        Self {
            session_id,
            messages: vec![ChatMessage::anchored_assistant(GREETING, GREETING_ID)],
            history: Vec::new(),
            msg_counter: 0,
        }
    }

    /// Identity of this session, stable across `reset()`, gone at exit.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    // ── Ids ──────────────────────────────────────────────

    /// Allocate the next message id. Strictly increasing, never reused
    /// within a session.
    pub fn next_id(&mut self) -> String {
        self.msg_counter += 1;
        format!("msg_{}", self.msg_counter)
    }

    // ── Message log ──────────────────────────────────────

    /// Append to the message log. No deduplication.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn find_message_by_id(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id.as_deref() == Some(id))
    }

    // ── History log ──────────────────────────────────────

    /// Append a history entry unless the most recently appended entry has
    /// the same query text (adjacent-duplicate suppression only; a repeated
    /// query after other queries in between creates a new entry, since the
    /// user may intentionally re-ask).
    ///
    /// Returns the index of the entry representing this turn: the fresh one,
    /// or the suppressed-duplicate predecessor.
    pub fn append_history(&mut self, label: &str, query: &str, id: &str) -> usize {
        if let Some(last) = self.history.last() {
            if last.query == query {
                return self.history.len() - 1;
            }
        }
        self.history.push(HistoryEntry::new(label, query, id));
        self.history.len() - 1
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn find_history_by_id(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.iter().find(|h| h.id == id)
    }

    /// The newest entry with a recorded response for this exact query text.
    ///
    /// Newest-first, so a repeated query replays the most recently recorded
    /// answer. Entries without a response (in flight, or failed) never match.
    pub fn find_history_by_query(&self, query: &str) -> Option<&HistoryEntry> {
        self.history
            .iter()
            .rev()
            .find(|h| h.query == query && h.has_response())
    }

    /// Record the terminal answer on the entry at `index`. Idempotent in
    /// effect when called again with the same answer.
    pub fn set_response(&mut self, index: usize, answer: &str) {
        if let Some(entry) = self.history.get_mut(index) {
            entry.response = Some(answer.to_string());
        }
    }

    // ── Reset ────────────────────────────────────────────

    /// Clear the transcript back to the seed greeting, drop the history,
    /// and restart the id counter (the next id is `msg_1` again).
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::anchored_assistant(GREETING, GREETING_ID)];
        self.history.clear();
        self.msg_counter = 0;
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
