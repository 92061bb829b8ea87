//! Trigger and scroll-cue values exchanged with the presentation layer.

use std::time::Duration;

/// Settle delay when the scroll target is already rendered.
pub const SETTLE_EXISTING: Duration = Duration::from_millis(100);

/// Settle delay when the pass appended fresh content; freshly rendered
/// output needs to paint before the viewport can measure its position.
pub const SETTLE_FRESH: Duration = Duration::from_millis(1000);

/// A transient command describing the next reconciliation step.
///
/// Consumed exactly once per occurrence: [`reconcile`] takes it by value, so
/// a trigger cannot survive into a second pass.
///
/// [`reconcile`]: super::reconciler::reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A quick-action button or free-form input.
    NewSearch { label: String, query: String },
    /// A sidebar history selection.
    HistoryClick { id: String },
}

/// Where the viewport should move after a pass, and how long to let the
/// content settle first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollCue {
    pub target_id: String,
    pub settle: Duration,
}

impl ScrollCue {
    /// Cue for a message that is already on screen.
    pub fn existing(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            settle: SETTLE_EXISTING,
        }
    }

    /// Cue for a message appended during this pass.
    pub fn fresh(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            settle: SETTLE_FRESH,
        }
    }
}
