use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::MessageRole;

/// A single message in the visible transcript.
///
/// Created on append and never mutated afterwards. `from_cache` is fixed at
/// creation time: true when the content was replayed from history instead of
/// returned by a fresh engine call, so the view can annotate the turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Scroll anchor, shared with the history entry that opened this turn.
    /// Assistant messages carry no anchor of their own.
    pub id: Option<String>,
    pub from_cache: bool,
    pub timestamp: NaiveDateTime,
}

impl ChatMessage {
    /// A user turn, anchored by the id allocated for it.
    pub fn user(content: &str, id: &str) -> Self {
        Self {
            role: MessageRole::User,
            content: content.to_string(),
            id: Some(id.to_string()),
            from_cache: false,
            timestamp: Local::now().naive_local(),
        }
    }

    /// An assistant turn carrying a fresh engine answer.
    pub fn assistant(content: &str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.to_string(),
            id: None,
            from_cache: false,
            timestamp: Local::now().naive_local(),
        }
    }

    /// An assistant turn replayed from history.
    pub fn cached_assistant(content: &str) -> Self {
        Self {
            from_cache: true,
            ..Self::assistant(content)
        }
    }

    /// An assistant message with an explicit anchor (the seed greeting).
    pub fn anchored_assistant(content: &str, id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::assistant(content)
        }
    }
}
