use async_trait::async_trait;

use crate::domain::conversation::{ConversationId, ConversationTurn, Role};
use crate::errors::ApplicationError;

/// Persisted chat transcript, one stream per conversation.
#[async_trait]
pub trait ConversationHistory: Send + Sync {
    /// The most recent `limit` turns, oldest first.
    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, ApplicationError>;

    async fn append_turn(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), ApplicationError>;
}

/// Reference snippets injected into the prompt as background context.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Rendered context block, or `None` when nothing matches.
    async fn search_context(&self, text: &str) -> Result<Option<String>, ApplicationError>;
}
