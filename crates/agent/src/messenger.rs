use async_trait::async_trait;
use thiserror::Error;

use meesaya_core::domain::conversation::ConversationId;

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("messenger transport failure: {0}")]
    Transport(String),
    #[error("messenger rejected request with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Delivery channel back to the chat the message came from.
#[async_trait]
pub trait OutboundMessenger: Send + Sync {
    async fn send_typing(&self, chat: &ConversationId) -> Result<(), MessengerError>;

    async fn send_message(&self, chat: &ConversationId, text: &str) -> Result<(), MessengerError>;
}
