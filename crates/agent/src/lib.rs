//! Conversation runtime for the MeeSaya advisor.
//!
//! One inbound chat message flows through:
//! 1. **Prompt assembly** (`prompt`) - persona, recent history and knowledge context
//! 2. **First pass** (`llm`) - the model answers or emits a tool call as JSON
//! 3. **Tool dispatch** (`tools`) - sizing or inventory search against the catalog
//! 4. **Second pass** - the model explains the tool output to the user
//!
//! # Key Types
//!
//! - `ConversationOrchestrator` - drives the passes (see `conversation`)
//! - `LlmClient` - pluggable text generation, `OpenRouterClient` in production
//! - `OutboundMessenger` - delivery back to the chat platform
//!
//! # Safety Principle
//!
//! The model only chooses which tool to call. Prices and configurations come
//! from the deterministic sizing engine in `meesaya-core`.

pub mod conversation;
pub mod llm;
pub mod messenger;
pub mod prompt;
pub mod tools;

pub use conversation::{
    ConversationOrchestrator, ConversationOutcome, OrchestratorSettings, OrchestratorState,
};
pub use llm::{LlmClient, LlmError, OpenRouterClient};
pub use messenger::{MessengerError, OutboundMessenger};
pub use tools::{extract_invocation, ToolDispatcher, ToolError, ToolInvocation};
