//! Answer engine: the only network-facing seam.
//!
//! The reconciler consumes the engine as an opaque capability: text query
//! in, text answer (or error) out. The real implementation is a chat model
//! driven in a bounded web-search tool loop; tests use the mock.

pub mod agent;
pub mod openai;
pub mod search;

pub use agent::SearchAgent;
pub use openai::ChatClient;
pub use search::SearchClient;

use std::cell::{Cell, RefCell};

use thiserror::Error;

/// Executes one query against the language model. Blocking: the caller's
/// reconciliation pass waits for the result, and timeout policy lives
/// entirely on this side of the seam.
pub trait AnswerEngine {
    fn answer(&self, query: &str) -> Result<String, EngineError>;
}

/// Per-turn engine failures. All recoverable: the turn shows the error and
/// the user may re-ask to retry.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot reach {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("API returned error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("malformed response: {0}")]
    ResponseParsing(String),

    #[error("model returned no answer")]
    EmptyAnswer,

    #[error("tool loop exceeded {0} rounds without a final answer")]
    ToolLoopExceeded(usize),

    #[error("web search failed: {0}")]
    Search(String),
}

/// Mock engine for tests: a canned answer (or failure) plus call counting,
/// so tests can assert that cache hits never reach the engine.
pub struct MockAnswerEngine {
    response: String,
    failure: Option<String>,
    calls: Cell<usize>,
    last_query: RefCell<Option<String>>,
}

impl MockAnswerEngine {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failure: None,
            calls: Cell::new(0),
            last_query: RefCell::new(None),
        }
    }

    /// An engine whose every call fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new("")
        }
    }

    /// How many times `answer` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// The query text of the most recent invocation.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.borrow().clone()
    }
}

impl AnswerEngine for MockAnswerEngine {
    fn answer(&self, query: &str) -> Result<String, EngineError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_query.borrow_mut() = Some(query.to_string());
        match &self.failure {
            Some(message) => Err(EngineError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(self.response.clone()),
        }
    }
}
