//! Tool-calling orchestration between the chat API, the LLM completion
//! service, and the pricing-rules REST API.
//!
//! The crate is organized leaf-first:
//! - `catalog` - the static registry of callable tools and their schemas
//! - `executor` - dispatch from (tool name, args) to one pricing-API request,
//!   normalized into a success/failure envelope
//! - `transcript` - the turn/part model sent to the LLM and the initial
//!   framing built from persisted chat history
//! - `llm` - the completion-service client trait, its Gemini implementation,
//!   and the keyless demo implementation
//! - `completion` - the bounded request/execute/append loop that drives a
//!   conversation to a final answer
//! - `prompts` - advisory system-prompt text
//!
//! # Orchestration principle
//!
//! The LLM decides *which* tools to call; this crate enforces only the
//! structural contract: known tool names, a hard iteration ceiling, and
//! uniform in-band error envelopes. Tool failures are data the model can
//! read and recover from, never Rust errors.

pub mod catalog;
pub mod completion;
pub mod executor;
pub mod llm;
pub mod prompts;
pub mod transcript;

pub use completion::{CompletionLoop, MAX_TOOL_ITERATIONS};
pub use executor::{PricingApiClient, ToolExecutor, ToolOutcome};
pub use llm::{DemoClient, GeminiClient, LlmClient, LlmError};
pub use transcript::{build_initial_transcript, Part, Turn, TurnRole};
