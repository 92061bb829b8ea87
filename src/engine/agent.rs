//! Search-augmented answer agent.
//!
//! Drives the chat model in a bounded tool loop: the model may request
//! `web_search` calls, each is executed and fed back as a tool message, and
//! the first reply without tool calls is the final answer.

use serde_json::json;

use super::openai::{ChatClient, FunctionSpec, ToolCall, ToolDef, WireMessage};
use super::search::{format_results, SearchClient};
use super::{AnswerEngine, EngineError};
use crate::prompts;

/// Upper bound on model/tool round trips for one query.
pub const MAX_TOOL_ROUNDS: usize = 6;

const SEARCH_TOOL_NAME: &str = "web_search";

/// The production [`AnswerEngine`]: chat model + web search.
pub struct SearchAgent {
    llm: ChatClient,
    search: SearchClient,
    system_prompt: String,
}

impl SearchAgent {
    pub fn new(llm: ChatClient, search: SearchClient, answer_language: &str) -> Self {
        Self {
            llm,
            search,
            system_prompt: prompts::system_prompt(answer_language),
        }
    }

    fn search_tool() -> ToolDef {
        ToolDef {
            def_type: "function",
            function: FunctionSpec {
                name: SEARCH_TOOL_NAME,
                description: "Search the web for current medical guidance. \
                              Returns titles, URLs and content snippets.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query, in English."
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }

    /// Execute one requested tool call. Failures are reported back to the
    /// model as tool output so a flaky search does not kill the whole turn.
    fn run_tool_call(&self, call: &ToolCall) -> WireMessage {
        let content = if call.function.name == SEARCH_TOOL_NAME {
            match parse_search_query(&call.function.arguments) {
                Some(query) => {
                    tracing::debug!(query = %query, "executing web search");
                    match self.search.search(&query) {
                        Ok(results) => format_results(&results),
                        Err(e) => format!("Search failed: {e}"),
                    }
                }
                None => format!(
                    "Invalid arguments for {SEARCH_TOOL_NAME}: expected {{\"query\": …}}, \
                     got: {}",
                    call.function.arguments
                ),
            }
        } else {
            format!("Unknown tool: {}", call.function.name)
        };

        WireMessage::tool(&call.id, &content)
    }
}

/// Extract the `query` string from the model's JSON-encoded arguments.
fn parse_search_query(arguments: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(arguments).ok()?;
    value
        .get("query")
        .and_then(|q| q.as_str())
        .map(|q| q.to_string())
        .filter(|q| !q.trim().is_empty())
}

impl AnswerEngine for SearchAgent {
    fn answer(&self, query: &str) -> Result<String, EngineError> {
        let tools = [Self::search_tool()];
        let mut messages = vec![
            WireMessage::system(&self.system_prompt),
            WireMessage::user(query),
        ];

        for round in 0..MAX_TOOL_ROUNDS {
            let reply = self.llm.complete(&messages, &tools)?;

            if reply.tool_calls.is_empty() {
                return reply
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .ok_or(EngineError::EmptyAnswer);
            }

            tracing::debug!(round, calls = reply.tool_calls.len(), "model requested searches");
            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                messages.push(self.run_tool_call(call));
            }
        }

        Err(EngineError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
