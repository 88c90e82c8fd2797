//! The bounded completion loop.
//!
//! One invocation serves one inbound user message: send the accumulated
//! transcript plus the tool catalog, then either return the model's text or
//! execute its tool calls, append both sides of the exchange, and go again.
//! The tool-round ceiling is checked after each executed batch and before
//! the next request, so at most `MAX_TOOL_ITERATIONS` completion requests
//! are ever issued. Every failure path resolves to assistant-visible text;
//! the loop never raises.

use serde_json::json;
use tracing::{debug, error, info};

use crate::catalog;
use crate::executor::ToolExecutor;
use crate::llm::{LlmClient, LlmError};
use crate::transcript::{FunctionCall, FunctionResponse, Part, Turn, TurnRole};

/// Hard bound on tool-executing rounds per invocation. Prevents infinite
/// request/tool-call cycles when the model oscillates.
pub const MAX_TOOL_ITERATIONS: u32 = 5;

pub const UNEXPECTED_FORMAT_MESSAGE: &str =
    "I received an unexpected response format from the API.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "I received an empty response from the AI.";
pub const NO_TEXT_MESSAGE: &str = "I couldn't generate a proper response.";
pub const CEILING_MESSAGE: &str =
    "I reached the maximum number of function calls. Please try rephrasing your request.";
pub const INVALID_KEY_MESSAGE: &str =
    "Invalid API key. Please check the configured Gemini API key.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    AwaitingModel,
    ExecutingTools,
    HasFinalText,
    CeilingReached,
}

pub struct CompletionLoop<'a> {
    llm: &'a dyn LlmClient,
    executor: &'a dyn ToolExecutor,
}

impl<'a> CompletionLoop<'a> {
    pub fn new(llm: &'a dyn LlmClient, executor: &'a dyn ToolExecutor) -> Self {
        Self { llm, executor }
    }

    /// Drive the transcript to a final answer. The transcript grows
    /// monotonically within this call and is discarded afterwards; the
    /// returned text is the only externally visible artifact.
    pub async fn run(&self, mut transcript: Vec<Turn>) -> String {
        let mut tool_rounds: u32 = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            debug!(state = ?state, rounds = tool_rounds, "requesting completion");

            let reply = match self.llm.generate(&transcript, catalog::all_tools()).await {
                Ok(reply) => reply,
                Err(LlmError::Http { status, body }) => {
                    error!(status, "LLM service returned an error status");
                    if status == 401 || body.contains("API_KEY_INVALID") {
                        return INVALID_KEY_MESSAGE.to_string();
                    }
                    return format!(
                        "I encountered an error communicating with the AI service. Status: {status}"
                    );
                }
                Err(LlmError::Transport(message)) => {
                    error!(error = %message, "LLM transport failure");
                    return format!("I encountered an error: {message}. Please try again later.");
                }
            };

            let Some(candidate) = reply.candidates.into_iter().next() else {
                error!("completion response carried no candidates");
                return UNEXPECTED_FORMAT_MESSAGE.to_string();
            };

            let parts = candidate.content.parts;
            if parts.is_empty() {
                return EMPTY_RESPONSE_MESSAGE.to_string();
            }

            let calls: Vec<FunctionCall> = parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall(call) => Some(call.clone()),
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                state = LoopState::HasFinalText;
                debug!(state = ?state, rounds = tool_rounds, "loop terminated with text");
                let texts: Vec<&str> = parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if texts.is_empty() {
                    return NO_TEXT_MESSAGE.to_string();
                }
                return texts.join(" ");
            }

            state = LoopState::ExecutingTools;
            debug!(state = ?state, calls = calls.len(), "executing tool batch");

            // The request turn is appended as the model issued it; the
            // matching result turn follows only after execution.
            transcript.push(Turn {
                role: TurnRole::Model,
                parts: calls.iter().cloned().map(Part::FunctionCall).collect(),
            });

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                info!(tool = %call.name, "dispatching tool call");
                let outcome = self.executor.execute(&call.name, &call.args).await;
                responses.push(Part::FunctionResponse(FunctionResponse {
                    name: call.name.clone(),
                    response: json!({ "name": call.name, "content": outcome }),
                    id: call.id.clone(),
                }));
            }

            transcript.push(Turn { role: TurnRole::User, parts: responses });

            tool_rounds += 1;
            if tool_rounds >= MAX_TOOL_ITERATIONS {
                state = LoopState::CeilingReached;
                info!(state = ?state, rounds = tool_rounds, "tool-call ceiling reached");
                return CEILING_MESSAGE.to_string();
            }

            state = LoopState::AwaitingModel;
        }
    }
}
