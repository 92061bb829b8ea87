use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One sidebar history entry: a query the user fired and, once the engine
/// returned, its answer.
///
/// `response` is the authoritative cache key: an entry without it represents
/// a query still in flight or one whose engine call failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Short display text shown in the sidebar.
    pub label: String,
    /// The exact text sent to the answer engine.
    pub query: String,
    /// Anchor shared with the user message that opened the turn.
    pub id: String,
    pub response: Option<String>,
    pub created_at: NaiveDateTime,
}

impl HistoryEntry {
    pub fn new(label: &str, query: &str, id: &str) -> Self {
        Self {
            label: label.to_string(),
            query: query.to_string(),
            id: id.to_string(),
            response: None,
            created_at: Local::now().naive_local(),
        }
    }

    /// Whether a terminal answer has been recorded.
    pub fn has_response(&self) -> bool {
        self.response.as_deref().is_some_and(|r| !r.is_empty())
    }
}
