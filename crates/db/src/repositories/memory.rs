use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use meesaya_core::conversation::{ConversationHistory, KnowledgeBase};
use meesaya_core::domain::conversation::{ConversationId, ConversationTurn, Role};
use meesaya_core::errors::ApplicationError;

use super::knowledge::{keywords, render_context};

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[derive(Default)]
pub struct InMemoryConversationHistory {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

#[async_trait]
impl ConversationHistory for InMemoryConversationHistory {
    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, ApplicationError> {
        let turns = self.turns.read().await;
        let Some(stored) = turns.get(&conversation_id.0) else {
            return Ok(Vec::new());
        };
        let skip = stored.len().saturating_sub(limit as usize);
        Ok(stored[skip..]
            .iter()
            .map(|turn| ConversationTurn::new(Role::from_stored(turn.role.as_str()), &turn.content))
            .collect())
    }

    async fn append_turn(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), ApplicationError> {
        let mut turns = self.turns.write().await;
        turns
            .entry(conversation_id.0.clone())
            .or_default()
            .push(ConversationTurn::new(role, content));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryKnowledgeBase {
    entries: RwLock<Vec<(String, String)>>,
}

impl InMemoryKnowledgeBase {
    pub async fn add_entry(&self, category: impl Into<String>, content: impl Into<String>) {
        self.entries.write().await.push((category.into(), content.into()));
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn search_context(&self, text: &str) -> Result<Option<String>, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let entries = self.entries.read().await;
        let phrase = text.to_lowercase();
        let mut hits: Vec<(String, String)> = entries
            .iter()
            .filter(|(category, content)| {
                contains_ignore_case(content, &phrase) || contains_ignore_case(category, &phrase)
            })
            .take(2)
            .cloned()
            .collect();

        if hits.is_empty() && text.contains(char::is_whitespace) {
            let words: Vec<String> = keywords(text).iter().map(|word| word.to_lowercase()).collect();
            hits = entries
                .iter()
                .filter(|(_, content)| words.iter().any(|word| contains_ignore_case(content, word)))
                .take(2)
                .cloned()
                .collect();
        }

        Ok(render_context(&hits))
    }
}
