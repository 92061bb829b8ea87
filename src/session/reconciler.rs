//! Trigger reconciliation: one pass per user action.
//!
//! Given a pending trigger and the current store, decide whether to scroll
//! to an existing message, replay a cached answer, or invoke the engine.
//! A pass runs to completion synchronously; the engine call is the only
//! blocking point, and no other pass can observe a partially-updated store.

use crate::engine::AnswerEngine;
use crate::models::ChatMessage;

use super::store::ConversationStore;
use super::trigger::{ScrollCue, Trigger};

/// Terminal state of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The target was located (or re-materialized from history); no engine
    /// call was made. Just move the viewport.
    Scroll(ScrollCue),
    /// A new turn was answered: by a fresh engine call, or replayed from
    /// cache when `from_cache` is set.
    Answered { cue: ScrollCue, from_cache: bool },
    /// The engine call failed. The turn shows `error` in place of an answer
    /// and its history entry stays response-less, so re-asking retries the
    /// engine instead of replaying a failure.
    Failed { cue: ScrollCue, error: String },
    /// Nothing to do: unknown id, or a history entry with no stored
    /// response (the original query text is gone, so nothing can be shown).
    Ignored,
}

/// Run one reconciliation pass. The trigger is consumed by value, so it
/// cannot be reprocessed if the caller re-enters for unrelated reasons.
pub fn reconcile(
    store: &mut ConversationStore,
    trigger: Trigger,
    engine: &dyn AnswerEngine,
) -> Resolution {
    match trigger {
        Trigger::HistoryClick { id } => resolve_history_click(store, &id),
        Trigger::NewSearch { label, query } => resolve_new_search(store, &label, &query, engine),
    }
}

/// A history selection never invokes the engine: either the turn is still
/// on screen, or it is re-materialized from the stored label/response.
fn resolve_history_click(store: &mut ConversationStore, id: &str) -> Resolution {
    if store.find_message_by_id(id).is_some() {
        tracing::debug!(id, "history click: message already visible");
        return Resolution::Scroll(ScrollCue::existing(id));
    }

    let replay = store.find_history_by_id(id).and_then(|entry| {
        entry
            .has_response()
            .then(|| (entry.label.clone(), entry.response.clone().unwrap_or_default()))
    });

    match replay {
        Some((label, response)) => {
            store.push_message(ChatMessage::user(&label, id));
            store.push_message(ChatMessage::cached_assistant(&response));
            tracing::info!(id, "history click: turn re-materialized from history");
            Resolution::Scroll(ScrollCue::fresh(id))
        }
        None => {
            tracing::debug!(id, "history click: no entry or no response, ignoring");
            Resolution::Ignored
        }
    }
}

/// Every new search opens a new visible turn; whether the answer comes from
/// cache or from the engine is decided after the turn is opened.
fn resolve_new_search(
    store: &mut ConversationStore,
    label: &str,
    query: &str,
    engine: &dyn AnswerEngine,
) -> Resolution {
    let id = store.next_id();
    store.push_message(ChatMessage::user(label, &id));
    let turn = store.append_history(label, query, &id);

    // Only entries with a recorded response can match, so the response-less
    // entry just appended never shadows an earlier answer.
    let cached = store
        .find_history_by_query(query)
        .and_then(|hit| hit.response.clone());

    if let Some(answer) = cached {
        store.push_message(ChatMessage::cached_assistant(&answer));
        store.set_response(turn, &answer);
        tracing::info!(id = %id, "answered from cache, engine not invoked");
        return Resolution::Answered {
            cue: ScrollCue::fresh(&id),
            from_cache: true,
        };
    }

    match engine.answer(query) {
        Ok(answer) => {
            store.push_message(ChatMessage::assistant(&answer));
            store.set_response(turn, &answer);
            tracing::info!(id = %id, "answered by engine");
            Resolution::Answered {
                cue: ScrollCue::fresh(&id),
                from_cache: false,
            }
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "engine call failed, turn left response-less");
            Resolution::Failed {
                cue: ScrollCue::fresh(&id),
                error: e.to_string(),
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockAnswerEngine;
    use crate::models::MessageRole;
    use crate::prompts::{compose, DiseaseAction, QueryRequest};
    use crate::session::trigger::{SETTLE_EXISTING, SETTLE_FRESH};

    fn search(label: &str, query: &str) -> Trigger {
        Trigger::NewSearch {
            label: label.to_string(),
            query: query.to_string(),
        }
    }

    fn click(id: &str) -> Trigger {
        Trigger::HistoryClick { id: id.to_string() }
    }

    // ── New search ───────────────────────────────────────

    #[test]
    fn fresh_search_invokes_engine_and_records_turn() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("An answer with sources.");

        let resolution = reconcile(&mut store, search("Red flags for [Sepsis]", "Q1"), &engine);

        assert_eq!(engine.calls(), 1);
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_1"),
                from_cache: false,
            }
        );
        // greeting + user + assistant
        assert_eq!(store.messages().len(), 3);
        assert_eq!(store.messages()[1].role, MessageRole::User);
        assert_eq!(store.messages()[1].content, "Red flags for [Sepsis]");
        assert_eq!(store.messages()[2].content, "An answer with sources.");
        assert!(!store.messages()[2].from_cache);

        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].response.as_deref(), Some("An answer with sources."));
    }

    #[test]
    fn repeated_query_replays_cache_without_engine_call() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("Cached answer.");

        reconcile(&mut store, search("label", "Q1"), &engine);
        assert_eq!(engine.calls(), 1);

        let resolution = reconcile(&mut store, search("label", "Q1"), &engine);

        assert_eq!(engine.calls(), 1, "cache hit must not invoke the engine");
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_2"),
                from_cache: true,
            }
        );
        // A repeated query still opens a new visible turn…
        assert_eq!(store.messages().len(), 5);
        let replayed = &store.messages()[4];
        assert_eq!(replayed.content, "Cached answer.");
        assert!(replayed.from_cache, "replayed turn is annotated");
        // …but adjacent-duplicate suppression keeps one history entry.
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn non_adjacent_repeat_replays_newest_answer() {
        let mut store = ConversationStore::new();

        let first = MockAnswerEngine::new("old answer");
        reconcile(&mut store, search("a", "Q1"), &first);

        let second = MockAnswerEngine::new("other");
        reconcile(&mut store, search("b", "Q2"), &second);

        // Re-ask Q1 with a fresh engine the pass must not touch.
        let third = MockAnswerEngine::new("should not be called");
        let resolution = reconcile(&mut store, search("a", "Q1"), &third);

        assert_eq!(third.calls(), 0);
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_3"),
                from_cache: true,
            }
        );
        // Three entries: Q1, Q2, Q1 again (non-adjacent repeat).
        assert_eq!(store.history().len(), 3);
        // The replayed turn recorded the answer on its own entry too.
        assert_eq!(store.history()[2].response.as_deref(), Some("old answer"));
    }

    #[test]
    fn engine_failure_surfaces_error_and_keeps_turn_retryable() {
        let mut store = ConversationStore::new();
        let failing = MockAnswerEngine::failing("quota exceeded");

        let resolution = reconcile(&mut store, search("label", "Q1"), &failing);

        match resolution {
            Resolution::Failed { cue, error } => {
                assert_eq!(cue, ScrollCue::fresh("msg_1"));
                assert!(error.contains("quota exceeded"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        // No assistant message in place of the failed answer.
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[1].role, MessageRole::User);
        // The entry stays response-less, so the same query retries.
        assert_eq!(store.history().len(), 1);
        assert!(store.history()[0].response.is_none());

        let retry = MockAnswerEngine::new("recovered answer");
        let resolution = reconcile(&mut store, search("label", "Q1"), &retry);
        assert_eq!(retry.calls(), 1, "retry must reach the engine");
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_2"),
                from_cache: false,
            }
        );
        assert_eq!(store.history()[0].response.as_deref(), Some("recovered answer"));
    }

    // ── History click ────────────────────────────────────

    #[test]
    fn click_on_visible_message_scrolls_without_engine() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("answer");
        reconcile(&mut store, search("label", "Q1"), &engine);
        let before = store.messages().len();

        let resolution = reconcile(&mut store, click("msg_1"), &engine);

        assert_eq!(engine.calls(), 1, "no second engine call");
        assert_eq!(resolution, Resolution::Scroll(ScrollCue::existing("msg_1")));
        assert_eq!(store.messages().len(), before, "no duplicate message pair");
    }

    #[test]
    fn click_after_reset_rematerializes_turn() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("stored answer");
        reconcile(&mut store, search("the label", "Q1"), &engine);

        // Simulate the turn leaving the transcript while history survives:
        // replace the message log only.
        let history: Vec<_> = store.history().to_vec();
        store.reset();
        for entry in &history {
            let idx = store.append_history(&entry.label, &entry.query, &entry.id);
            if let Some(resp) = &entry.response {
                store.set_response(idx, resp);
            }
        }

        let resolution = reconcile(&mut store, click("msg_1"), &engine);

        assert_eq!(engine.calls(), 1);
        assert_eq!(resolution, Resolution::Scroll(ScrollCue::fresh("msg_1")));
        // Exactly one user + one assistant message re-materialized.
        assert_eq!(store.messages().len(), 3);
        assert_eq!(store.messages()[1].content, "the label");
        assert_eq!(store.messages()[1].id.as_deref(), Some("msg_1"));
        assert_eq!(store.messages()[2].content, "stored answer");
        assert!(store.messages()[2].from_cache);
    }

    #[test]
    fn click_on_unknown_id_is_ignored() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("answer");

        let resolution = reconcile(&mut store, click("msg_42"), &engine);

        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(engine.calls(), 0);
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn click_on_responseless_entry_is_ignored() {
        let mut store = ConversationStore::new();
        let failing = MockAnswerEngine::failing("boom");
        reconcile(&mut store, search("label", "Q1"), &failing);

        // The failed turn's user message is visible, so clicking scrolls to it.
        let resolution = reconcile(&mut store, click("msg_1"), &failing);
        assert_eq!(resolution, Resolution::Scroll(ScrollCue::existing("msg_1")));

        // Once the transcript is gone, a response-less entry cannot be shown.
        let history: Vec<_> = store.history().to_vec();
        store.reset();
        for entry in &history {
            store.append_history(&entry.label, &entry.query, &entry.id);
        }
        let resolution = reconcile(&mut store, click("msg_1"), &failing);
        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(store.messages().len(), 1, "nothing is shown");
    }

    // ── Settle delays ────────────────────────────────────

    #[test]
    fn settle_delay_matches_content_freshness() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("answer");

        match reconcile(&mut store, search("label", "Q1"), &engine) {
            Resolution::Answered { cue, .. } => assert_eq!(cue.settle, SETTLE_FRESH),
            other => panic!("expected Answered, got {other:?}"),
        }
        match reconcile(&mut store, click("msg_1"), &engine) {
            Resolution::Scroll(cue) => assert_eq!(cue.settle, SETTLE_EXISTING),
            other => panic!("expected Scroll, got {other:?}"),
        }
    }

    // ── End to end ───────────────────────────────────────

    #[test]
    fn sepsis_quick_action_end_to_end() {
        let mut store = ConversationStore::new();
        let engine = MockAnswerEngine::new("Sepsis-3 requires… Sources: https://…");

        let composed = compose(
            &QueryRequest::Disease {
                kind: DiseaseAction::DiagnosticCriteria,
                name: "Sepsis",
            },
            "English",
        )
        .unwrap();

        let resolution = reconcile(
            &mut store,
            search(&composed.label, &composed.query),
            &engine,
        );

        assert_eq!(engine.calls(), 1);
        assert!(engine
            .last_query()
            .is_some_and(|q| q.contains("diagnostic guidelines for [Sepsis]")));
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_1"),
                from_cache: false,
            }
        );
        assert!(store.messages()[1].content.contains("Sepsis"));
        assert_eq!(
            store.history()[0].response.as_deref(),
            Some("Sepsis-3 requires… Sources: https://…")
        );

        // The recorded answer now serves as the cache for that exact query.
        let resolution = reconcile(
            &mut store,
            search(&composed.label, &composed.query),
            &engine,
        );
        assert_eq!(engine.calls(), 1);
        assert_eq!(
            resolution,
            Resolution::Answered {
                cue: ScrollCue::fresh("msg_2"),
                from_cache: true,
            }
        );
    }
}
